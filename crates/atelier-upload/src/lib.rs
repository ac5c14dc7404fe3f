//! Atelier Upload Library
//!
//! Moves client-selected files into a remote blob store:
//!
//! - single-file uploads with bounded, linearly backed-off retries
//! - a fallback key scheme when the primary path is blocked at the network level
//! - strictly sequential batches that stop at the first failed file
//! - best-effort removal by access locator
//! - 3D asset uploads restricted to an extension allow-list
//!
//! Everything runs sequentially on the caller's task; nothing here spawns.

pub mod batch;
pub mod cleanup;
pub mod fallback;
pub mod model;
pub mod policy;
pub mod service;

pub use model::validate_model_extension;
pub use policy::RetryPolicy;
pub use service::UploadService;
