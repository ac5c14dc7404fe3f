//! Blob store abstraction trait
//!
//! This module defines the `BlobStore` trait that all storage backends must
//! implement, and the classified errors they report.

use crate::StorageBackend;
use async_trait::async_trait;
use atelier_core::{AccessLocator, UploadError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Custom metadata key holding the client-side file name.
pub const META_ORIGINAL_NAME: &str = "originalName";
/// Custom metadata key holding the RFC 3339 upload timestamp.
pub const META_UPLOADED_AT: &str = "uploadedAt";
/// Custom metadata key recording the intended folder on the fallback path.
pub const META_ORIGINAL_FOLDER: &str = "originalFolder";

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The request never got a usable answer: cross-origin rejection, failed
    /// fetch, connection reset, a 5xx answer or an unknown transport error.
    #[error("Network blocked: {0}")]
    NetworkBlocked(String),

    /// The store answered and refused (any 4xx): quota, throttling, auth,
    /// precondition or validation.
    #[error("Rejected by storage backend: {0}")]
    Rejected(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Whether the same request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::NetworkBlocked(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NetworkBlocked(msg) => UploadError::NetworkBlocked(msg),
            StorageError::InvalidKey(msg) => UploadError::InvalidInput(msg),
            // A write that cannot be read back is treated as refused, not as flaky.
            StorageError::NotFound(key) => {
                UploadError::RemoteRejected(format!("Stored object not found: {}", key))
            }
            other => UploadError::RemoteRejected(other.to_string()),
        }
    }
}

/// Metadata attached to every written object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    #[serde(default)]
    pub custom: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            custom: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }
}

/// Reference to a completed write, handed back to resolve its access locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
}

/// Remote blob store capability
///
/// Writing and resolving are separate calls: a write can succeed and the
/// read-back still fail, which leaves an object nobody holds a locator for.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `key` with the given metadata.
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> StorageResult<StoredObject>;

    /// Turn a completed write into a durable URL.
    async fn resolve_access_locator(&self, object: &StoredObject) -> StorageResult<AccessLocator>;

    /// Delete the object stored under `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
