//! Atelier Storage Library
//!
//! This crate provides the remote blob store capability used by the upload
//! service: the `BlobStore` trait, storage key naming, and implementations for
//! S3-compatible object stores, the local filesystem and memory.
//!
//! # Storage key format
//!
//! - **Primary path**: `{folder}/{timestamp_ms}_{sanitized_name}`
//! - **Fallback path**: `{timestamp_ms}_{sanitized_name}` (folder kept in metadata)
//!
//! # Access locator format
//!
//! `{base_url}/{percent-encoded key}`. The whole key, folder included, lives in
//! the final path segment, so a locator can be turned back into its key.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use atelier_core::StorageBackend;
pub use factory::create_storage;
pub use keys::StorageKey;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{BlobStore, ObjectMetadata, StorageError, StorageResult, StoredObject};
