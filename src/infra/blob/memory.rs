use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use bytes::Bytes;

use super::BlobStore;

/// In-process blob store for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
}

impl MemoryBlobStore {
    pub fn with_blob(container: &str, blob: &str, body: &[u8]) -> Self {
        let store = Self::default();
        store.insert(container, blob, body.to_vec(), "text/csv");
        store
    }

    /// Body and content type of a stored blob.
    pub fn stored(&self, container: &str, blob: &str) -> Option<(Vec<u8>, String)> {
        self.blobs
            .lock()
            .unwrap()
            .get(&(container.to_string(), blob.to_string()))
            .cloned()
    }

    fn insert(&self, container: &str, blob: &str, body: Vec<u8>, content_type: &str) {
        self.blobs.lock().unwrap().insert(
            (container.to_string(), blob.to_string()),
            (body, content_type.to_string()),
        );
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, container: &str, blob: &str) -> Result<Bytes> {
        self.stored(container, blob)
            .map(|(body, _)| Bytes::from(body))
            .ok_or_else(|| anyhow!("blob '{container}/{blob}' not found"))
    }

    async fn put(&self, container: &str, blob: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.insert(container, blob, body, content_type);
        Ok(())
    }
}
