//! Atelier Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by the storage backends, the upload service and the CLI.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::UploadConfig;
pub use error::{ErrorMetadata, FailureKind, LogLevel, UploadError, UploadResult};
pub use models::{AccessLocator, UploadFile, UploadRequest, UploadStrategy};
pub use storage_types::StorageBackend;
