//! Shared test helpers: a blob store with scripted write failures.

#![allow(dead_code)]

use async_trait::async_trait;
use atelier_core::{AccessLocator, UploadConfig, UploadFile};
use atelier_storage::{
    BlobStore, MemoryStorage, ObjectMetadata, StorageBackend, StorageError, StorageKey,
    StorageResult, StoredObject,
};
use atelier_upload::UploadService;
use bytes::Bytes;
use std::sync::{Arc, Mutex};

/// Failure injected into a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFault {
    /// Transport-level failure (CORS, failed fetch).
    Blocked,
    /// The store answered with a refusal (quota).
    Rejected,
}

impl WriteFault {
    fn into_error(self, key: &str) -> StorageError {
        match self {
            WriteFault::Blocked => StorageError::NetworkBlocked(format!("Failed to fetch {}", key)),
            WriteFault::Rejected => StorageError::Rejected(format!("Quota exceeded for {}", key)),
        }
    }
}

/// One recorded call to `write`.
#[derive(Debug, Clone)]
pub struct WriteCall {
    pub key: String,
    pub metadata: ObjectMetadata,
    pub failed: bool,
}

type Rule = Box<dyn Fn(usize, &str) -> Option<WriteFault> + Send + Sync>;

/// Memory-backed store whose writes fail according to a rule on
/// (zero-based call index, key).
pub struct ScriptedStore {
    inner: MemoryStorage,
    rule: Rule,
    writes: Mutex<Vec<WriteCall>>,
    deletes: Mutex<Vec<String>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::with_rule(|_, _| None)
    }

    pub fn with_rule<F>(rule: F) -> Self
    where
        F: Fn(usize, &str) -> Option<WriteFault> + Send + Sync + 'static,
    {
        Self {
            inner: MemoryStorage::with_base_url("https://storage.test/o"),
            rule: Box::new(rule),
            writes: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// The first `n` writes fail with `fault`, later ones succeed.
    pub fn failing_first(n: usize, fault: WriteFault) -> Self {
        Self::with_rule(move |call, _| (call < n).then_some(fault))
    }

    /// Every write fails with `fault`.
    pub fn failing_always(fault: WriteFault) -> Self {
        Self::with_rule(move |_, _| Some(fault))
    }

    /// Writes to folder-prefixed keys fail with `fault`; folder-less keys succeed.
    pub fn failing_in_folders(fault: WriteFault) -> Self {
        Self::with_rule(move |_, key| key.contains('/').then_some(fault))
    }

    /// Writes whose key contains `needle` fail with `fault`.
    pub fn failing_keys_containing(needle: &'static str, fault: WriteFault) -> Self {
        Self::with_rule(move |_, key| key.contains(needle).then_some(fault))
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub async fn stored_keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait]
impl BlobStore for ScriptedStore {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> StorageResult<StoredObject> {
        let fault = {
            let mut writes = self.writes.lock().unwrap();
            let fault = (self.rule)(writes.len(), key);
            writes.push(WriteCall {
                key: key.to_string(),
                metadata: metadata.clone(),
                failed: fault.is_some(),
            });
            fault
        };

        match fault {
            Some(fault) => Err(fault.into_error(key)),
            None => self.inner.write(key, data, metadata).await,
        }
    }

    async fn resolve_access_locator(&self, object: &StoredObject) -> StorageResult<AccessLocator> {
        self.inner.resolve_access_locator(object).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.inner.delete(key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

pub fn service(store: &Arc<ScriptedStore>) -> UploadService {
    UploadService::new(store.clone(), UploadConfig::default())
}

pub fn image(name: &str) -> UploadFile {
    UploadFile::new(format!("bytes of {}", name).into_bytes(), name, "image/png")
}

/// Storage key encoded in a locator.
pub fn key_of(locator: &AccessLocator) -> String {
    StorageKey::from_access_locator(locator.as_str())
        .unwrap()
        .into_string()
}
