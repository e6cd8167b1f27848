//! Supabase backend: PostgREST for template records, Storage API for blobs
//!
//! Requests authenticate with the service-role key, so they bypass row-level
//! security. The key must never reach a browser.

use async_trait::async_trait;
use docmerge_core::{FieldDefinition, Template};
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;

use super::{validate_object_path, DocumentStore, StoreError, TemplateStore};

#[derive(Debug, Deserialize)]
struct TemplateRow {
    storage_path: String,
    editable_fields: Option<Vec<FieldDefinition>>,
}

#[derive(Debug, Deserialize)]
struct StorageErrorBody {
    #[serde(default, alias = "error")]
    message: Option<String>,
}

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: &str, table: &str) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("docmerge-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            table: table.to_string(),
        })
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Turn a non-success response into a backend error carrying its message
async fn backend_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<StorageErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or(body);
    StoreError::Backend { status, message }
}

#[async_trait]
impl TemplateStore for SupabaseStore {
    async fn get(&self, template_id: &str) -> Result<Template, StoreError> {
        let id_filter = format!("eq.{}", template_id);
        let response = self
            .authorized(self.client.get(self.rest_url()))
            .query(&[
                ("select", "storage_path,editable_fields"),
                ("id", id_filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let rows: Vec<TemplateRow> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidRecord(format!("{}: {}", template_id, e)))?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::TemplateNotFound(template_id.to_string()))?;

        Ok(Template {
            id: template_id.to_string(),
            storage_path: row.storage_path,
            editable_fields: row.editable_fields.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl DocumentStore for SupabaseStore {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError> {
        validate_object_path(path)?;
        let response = self
            .authorized(self.client.get(self.object_url(bucket, path)))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            }),
            _ => Err(backend_error(response).await),
        }
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        validate_object_path(path)?;
        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        Ok(())
    }
}
