//! Fallback path for uploads blocked at the network level.
//!
//! When the primary path keeps failing with `NetworkBlocked` (typically a
//! cross-origin policy on the folder-prefixed location), one more write goes
//! to a folder-less key and the intended folder is recorded as metadata.

use crate::service::{base_metadata, UploadService};
use atelier_core::{AccessLocator, FailureKind, UploadError, UploadRequest, UploadResult};
use atelier_storage::traits::META_ORIGINAL_FOLDER;
use atelier_storage::StorageKey;
use chrono::Utc;

impl UploadService {
    /// Upload one file, falling back to the alternate key scheme once.
    ///
    /// Failures other than invalid input come back as
    /// `UploadError::StorageUnavailable`, which names the file and keeps the
    /// underlying classified error as its source.
    #[tracing::instrument(skip(self, request), fields(file_name = %request.original_name()))]
    pub async fn upload_with_fallback(
        &self,
        request: &UploadRequest,
    ) -> UploadResult<AccessLocator> {
        let primary_err = match self.upload(request).await {
            Ok(locator) => return Ok(locator),
            Err(err) => err,
        };

        match primary_err.kind() {
            FailureKind::NetworkBlocked => {}
            FailureKind::InvalidInput => return Err(primary_err),
            FailureKind::RemoteRejected | FailureKind::BatchAborted => {
                return Err(UploadError::StorageUnavailable {
                    file_name: request.original_name().to_string(),
                    fallback_attempted: false,
                    source: Box::new(primary_err),
                });
            }
        }

        tracing::warn!(
            error = %primary_err,
            "Primary upload path blocked, trying fallback path"
        );

        match self.attempt_fallback(request).await {
            Ok(locator) => {
                tracing::info!(locator = %locator, "Fallback upload succeeded");
                Ok(locator)
            }
            Err(fallback_err) => {
                tracing::error!(
                    primary_error = %primary_err,
                    fallback_error = %fallback_err,
                    "Fallback upload failed"
                );
                Err(UploadError::StorageUnavailable {
                    file_name: request.original_name().to_string(),
                    fallback_attempted: true,
                    source: Box::new(fallback_err),
                })
            }
        }
    }

    /// Single write on the folder-less key scheme, no retries.
    async fn attempt_fallback(&self, request: &UploadRequest) -> UploadResult<AccessLocator> {
        let now = Utc::now();
        let key = StorageKey::fallback(self.next_key_timestamp(now), request.original_name());
        let metadata =
            base_metadata(request, now).with(META_ORIGINAL_FOLDER, request.destination_folder());
        self.write_and_resolve(&key, request, &metadata).await
    }
}
