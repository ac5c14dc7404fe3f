//! Best-effort removal of stored files.

use crate::service::UploadService;
use atelier_storage::{StorageError, StorageKey};

impl UploadService {
    /// Delete the file behind `locator`.
    ///
    /// Never fails: a malformed locator, an already deleted object or a
    /// backend error is logged and dropped. Callers must not assume the
    /// object is gone afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, locator: &str) {
        let key = match StorageKey::from_access_locator(locator) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot resolve storage key from locator, skipping delete");
                return;
            }
        };

        match self.store().delete(key.as_str()).await {
            Ok(()) => {
                tracing::info!(key = %key, "File removed");
            }
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(key = %key, "File not found or already deleted");
            }
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to remove file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::UploadService;
    use atelier_core::{UploadConfig, UploadFile, UploadRequest};
    use atelier_storage::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn removes_uploaded_file() {
        let store = MemoryStorage::new();
        let service = UploadService::new(Arc::new(store.clone()), UploadConfig::default());
        let request = UploadRequest::new(
            UploadFile::new(b"glTF".to_vec(), "chair.glb", "model/gltf-binary"),
            "products",
        );

        let locator = service.upload(&request).await.unwrap();
        assert_eq!(store.len().await, 1);

        service.remove(locator.as_str()).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn tolerates_missing_and_malformed_locators() {
        let store = MemoryStorage::new();
        let service = UploadService::new(Arc::new(store.clone()), UploadConfig::default());

        service.remove("memory://atelier/products%2F1_gone.png").await;
        service.remove("").await;
        service.remove("https://cdn.example.com/").await;
        service.remove("https://cdn.example.com/%2E%2E?alt=media").await;

        assert!(store.is_empty().await);
    }
}
