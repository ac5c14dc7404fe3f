use crate::keys::{access_locator, validate_key};
use crate::traits::{BlobStore, ObjectMetadata, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use atelier_core::AccessLocator;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "memory://atelier";

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    metadata: ObjectMetadata,
}

/// In-process storage, used by the CLI probe and by tests.
#[derive(Clone)]
pub struct MemoryStorage {
    objects: Arc<RwLock<HashMap<String, MemoryObject>>>,
    base_url: String,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<(Bytes, ObjectMetadata)> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| (object.data.clone(), object.metadata.clone()))
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryStorage {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> StorageResult<StoredObject> {
        validate_key(key)?;
        let size_bytes = data.len() as u64;

        self.objects.write().await.insert(
            key.to_string(),
            MemoryObject {
                data,
                metadata: metadata.clone(),
            },
        );

        tracing::debug!(key = %key, size_bytes, "Memory storage write successful");

        Ok(StoredObject {
            key: key.to_string(),
            size_bytes,
        })
    }

    async fn resolve_access_locator(&self, object: &StoredObject) -> StorageResult<AccessLocator> {
        if !self.objects.read().await.contains_key(&object.key) {
            return Err(StorageError::NotFound(object.key.clone()));
        }
        Ok(access_locator(&self.base_url, &object.key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        match self.objects.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
