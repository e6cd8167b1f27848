//! SQLite-backed template records for local development

use async_trait::async_trait;
use chrono::Utc;
use docmerge_core::{FieldDefinition, Template};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use super::{StoreError, TemplateStore};

#[derive(Debug, FromRow)]
struct DbTemplate {
    id: String,
    storage_path: String,
    editable_fields: String,
}

impl TryFrom<DbTemplate> for Template {
    type Error = StoreError;

    fn try_from(row: DbTemplate) -> Result<Self, Self::Error> {
        let editable_fields: Vec<FieldDefinition> = serde_json::from_str(&row.editable_fields)
            .map_err(|e| StoreError::InvalidRecord(format!("{}: {}", row.id, e)))?;
        Ok(Template {
            id: row.id,
            storage_path: row.storage_path,
            editable_fields,
        })
    }
}

pub struct SqliteTemplateStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteTemplateStore {
    /// Connect and create the template table if needed
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to database: {}", database_url);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        tracing::info!("Running database migrations...");

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                storage_path TEXT NOT NULL,
                editable_fields TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Store a template record; templates are immutable so an existing id is
    /// an error
    pub async fn insert(&self, template: &Template) -> Result<(), StoreError> {
        let fields = serde_json::to_string(&template.editable_fields)
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO {} (id, storage_path, editable_fields, created_at) VALUES (?, ?, ?, ?)",
            self.table
        ))
        .bind(&template.id)
        .bind(&template.storage_path)
        .bind(&fields)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::info!("Created template: {}", template.id);
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for SqliteTemplateStore {
    async fn get(&self, template_id: &str) -> Result<Template, StoreError> {
        let row: Option<DbTemplate> = sqlx::query_as(&format!(
            "SELECT id, storage_path, editable_fields FROM {} WHERE id = ?",
            self.table
        ))
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| StoreError::TemplateNotFound(template_id.to_string()))?
            .try_into()
    }
}
