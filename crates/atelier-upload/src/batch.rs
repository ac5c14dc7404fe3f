//! Sequential batch uploads.

use crate::service::UploadService;
use atelier_core::{
    AccessLocator, UploadError, UploadFile, UploadRequest, UploadResult, UploadStrategy,
};
use atelier_storage::keys::destination_folder;
use std::time::Duration;

impl UploadService {
    /// Upload `files` one after another into `folder` (or the default folder).
    ///
    /// Returns one locator per file in input order. The first failure stops
    /// the batch and is reported as `UploadError::BatchAborted` naming that
    /// file; files stored before it stay stored. A folder with no usable
    /// segment fails the whole batch as invalid input before any write.
    #[tracing::instrument(skip(self, files), fields(file_count = files.len()))]
    pub async fn upload_all(
        &self,
        files: Vec<UploadFile>,
        folder: Option<&str>,
        strategy: UploadStrategy,
    ) -> UploadResult<Vec<AccessLocator>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let folder = folder
            .unwrap_or(self.config().default_folder.as_str())
            .to_string();
        destination_folder(&folder)?;
        let pause = self.batch_pause(strategy);
        let total = files.len();

        let requests: Vec<UploadRequest> = files
            .into_iter()
            .map(|file| UploadRequest::new(file, folder.clone()))
            .collect();

        let mut locators = Vec::with_capacity(total);

        for (index, request) in requests.into_iter().enumerate() {
            if index > 0 {
                tracing::debug!(pause_ms = pause.as_millis() as u64, "Pausing between uploads");
                tokio::time::sleep(pause).await;
            }

            let outcome = match strategy {
                UploadStrategy::Direct => self.upload(&request).await,
                UploadStrategy::WithFallback => self.upload_with_fallback(&request).await,
            };

            match outcome {
                Ok(locator) => locators.push(locator),
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        file_name = %request.original_name(),
                        position = index + 1,
                        total,
                        stored = locators.len(),
                        "Batch upload aborted"
                    );
                    return Err(UploadError::BatchAborted {
                        file_name: request.original_name().to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }

        tracing::info!(total, folder = %folder, "Batch upload completed");
        Ok(locators)
    }

    fn batch_pause(&self, strategy: UploadStrategy) -> Duration {
        match strategy {
            UploadStrategy::Direct => self.config().batch_delay,
            UploadStrategy::WithFallback => self.config().fallback_batch_delay,
        }
    }
}
