//! Filesystem document store: one directory per bucket under a root

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{validate_object_path, DocumentStore, StoreError};

pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, StoreError> {
        validate_object_path(bucket)?;
        validate_object_path(path)?;
        Ok(self.root.join(bucket).join(path))
    }
}

/// Sibling of `full` used while its bytes are being written
fn staging_path(full: &Path) -> PathBuf {
    let name = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    full.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4()))
}

async fn write_staged(staging: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError> {
        let full = self.object_path(bucket, path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StoreError> {
        let full = self.object_path(bucket, path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stage, then link into place; the link fails if the object exists
        let staging = staging_path(&full);
        let published = match write_staged(&staging, &bytes).await {
            Ok(()) => tokio::fs::hard_link(&staging, &full).await,
            Err(e) => Err(e),
        };
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", staging.display(), e);
            }
        }
        published?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), full.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        store
            .upload("out", "signed/a.pdf", b"%PDF-1.7".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert!(dir.path().join("out/signed/a.pdf").exists());
        let bytes = store.download("out", "signed/a.pdf").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.download("templates", "nope.pdf").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        let err = store.download("templates", "../secret").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_upload_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        store.upload("b", "x.pdf", vec![1], "application/pdf").await.unwrap();
        let err = store.upload("b", "x.pdf", vec![2], "application/pdf").await;
        assert!(err.is_err());
        assert_eq!(store.download("b", "x.pdf").await.unwrap(), vec![1]);
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_upload_leaves_no_staging_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        store.upload("b", "signed/x.pdf", vec![1], "application/pdf").await.unwrap();
        let _ = store.upload("b", "signed/x.pdf", vec![2], "application/pdf").await;

        assert_eq!(entries(&dir.path().join("b/signed")), vec!["x.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_publish_removes_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(dir.path());
        // Something already at the final path makes the link step fail
        std::fs::create_dir_all(dir.path().join("b/signed/x.pdf")).unwrap();

        let err = store.upload("b", "signed/x.pdf", vec![1, 2, 3], "application/pdf").await;

        assert!(err.is_err());
        assert_eq!(entries(&dir.path().join("b/signed")), vec!["x.pdf".to_string()]);
        assert!(dir.path().join("b/signed/x.pdf").is_dir());
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let staging = staging_path(Path::new("/root/b/signed/x.pdf"));
        assert_eq!(staging.parent(), Some(Path::new("/root/b/signed")));
        let name = staging.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".x.pdf."));
        assert!(name.ends_with(".part"));
    }
}
