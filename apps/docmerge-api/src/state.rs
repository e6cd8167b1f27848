//! Application state for the merge service

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::store::fs::FsDocumentStore;
use crate::store::sqlite::SqliteTemplateStore;
use crate::store::supabase::SupabaseStore;
use crate::store::{DocumentStore, TemplateStore};

/// Collaborators and names shared by every request
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub template_bucket: String,
    pub output_bucket: String,
}

impl AppState {
    /// Build the configured backend
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (templates, documents): (Arc<dyn TemplateStore>, Arc<dyn DocumentStore>) =
            match &config.backend {
                StoreBackend::Supabase {
                    url,
                    service_role_key,
                } => {
                    info!("Using Supabase backend at {}", url);
                    let store = Arc::new(SupabaseStore::new(
                        url,
                        service_role_key,
                        &config.templates_table,
                    )?);
                    (store.clone() as Arc<dyn TemplateStore>, store as Arc<dyn DocumentStore>)
                }
                StoreBackend::Local {
                    database_url,
                    storage_root,
                } => {
                    if let Some(dir) = sqlite_parent_dir(database_url) {
                        tokio::fs::create_dir_all(dir).await?;
                    }
                    let templates =
                        SqliteTemplateStore::connect(database_url, &config.templates_table).await?;
                    let documents = FsDocumentStore::new(storage_root);
                    tokio::fs::create_dir_all(documents.root()).await?;
                    info!("Using local backend, buckets under {}", storage_root.display());
                    (
                        Arc::new(templates) as Arc<dyn TemplateStore>,
                        Arc::new(documents) as Arc<dyn DocumentStore>,
                    )
                }
            };

        Ok(Self::new(
            templates,
            documents,
            &config.template_bucket,
            &config.output_bucket,
        ))
    }

    pub fn new(
        templates: Arc<dyn TemplateStore>,
        documents: Arc<dyn DocumentStore>,
        template_bucket: &str,
        output_bucket: &str,
    ) -> Self {
        Self {
            templates,
            documents,
            template_bucket: template_bucket.to_string(),
            output_bucket: output_bucket.to_string(),
        }
    }
}

/// Directory holding a file-backed SQLite database, if the URL names one
fn sqlite_parent_dir(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url.strip_prefix("sqlite:")?;
    let path = path.trim_start_matches("//");
    let path = path.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}
