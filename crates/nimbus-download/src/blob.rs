//! In-memory payloads addressed by object-reference URLs

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const BLOB_URL_PREFIX: &str = "blob:nimbus/";

#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

impl Blob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Default)]
pub struct BlobStore {
    blobs: Arc<RwLock<HashMap<String, Blob>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a payload alive and hand out a URL that refers to it.
    pub fn insert(&self, bytes: Vec<u8>, mime_type: impl Into<String>) -> String {
        let url = format!("{BLOB_URL_PREFIX}{}", Uuid::new_v4());
        let blob = Blob {
            bytes: Arc::new(bytes),
            mime_type: mime_type.into(),
        };
        self.blobs.write().insert(url.clone(), blob);
        url
    }

    pub fn get(&self, url: &str) -> Option<Blob> {
        self.blobs.read().get(url).cloned()
    }

    /// Release a payload. Returns false if the URL was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.blobs.write().remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Clone for BlobStore {
    fn clone(&self) -> Self {
        Self {
            blobs: Arc::clone(&self.blobs),
        }
    }
}
