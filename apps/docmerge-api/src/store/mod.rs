//! Collaborator stores: template metadata and document blobs
//!
//! The merge handler only sees the two traits below. Backends:
//! - [`supabase::SupabaseStore`]: hosted PostgREST table + Storage API
//! - [`sqlite::SqliteTemplateStore`] and [`fs::FsDocumentStore`]: local development
//! - [`memory::MemoryStore`]: in-process, used by tests

use async_trait::async_trait;
use docmerge_core::Template;
use thiserror::Error;

pub mod fs;
pub mod memory;
pub mod sqlite;
pub mod supabase;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Object not found: {bucket}/{path}")]
    ObjectNotFound { bucket: String, path: String },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Invalid template record: {0}")]
    InvalidRecord(String),

    #[error("Storage backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read access to template records
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get(&self, template_id: &str) -> Result<Template, StoreError>;
}

/// Blob storage organised in buckets
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

/// Reject object paths that could escape their bucket
pub fn validate_object_path(path: &str) -> Result<(), StoreError> {
    let escapes = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if escapes {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}
