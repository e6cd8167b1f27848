//! In-process stores

use async_trait::async_trait;
use docmerge_core::Template;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{DocumentStore, StoreError, TemplateStore};

/// Templates and blobs held in memory, with call counters for assertions
#[derive(Default)]
pub struct MemoryStore {
    templates: RwLock<HashMap<String, Template>>,
    objects: RwLock<HashMap<(String, String), (Vec<u8>, String)>>,
    lookups: AtomicUsize,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&self, template: Template) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(template.id.clone(), template);
        }
    }

    pub fn put_object(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(
                (bucket.to_string(), path.to_string()),
                (bytes, content_type.to_string()),
            );
        }
    }

    /// Bytes and content type of a stored object
    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .read()
            .ok()?
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Paths stored in `bucket`, sorted
    pub fn paths(&self, bucket: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .read()
            .map(|objects| {
                objects
                    .keys()
                    .filter(|(b, _)| b == bucket)
                    .map(|(_, p)| p.clone())
                    .collect()
            })
            .unwrap_or_default();
        paths.sort();
        paths
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get(&self, template_id: &str) -> Result<Template, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.templates
            .read()
            .ok()
            .and_then(|templates| templates.get(template_id).cloned())
            .ok_or_else(|| StoreError::TemplateNotFound(template_id.to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StoreError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.object(bucket, path)
            .map(|(bytes, _)| bytes)
            .ok_or_else(|| StoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            })
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        super::validate_object_path(path)?;
        self.put_object(bucket, path, bytes, content_type);
        Ok(())
    }
}
