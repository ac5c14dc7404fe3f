//! Upload service and the single-file upload operation.

use crate::policy::RetryPolicy;
use atelier_core::{AccessLocator, UploadConfig, UploadError, UploadRequest, UploadResult};
use atelier_storage::traits::{META_ORIGINAL_NAME, META_UPLOADED_AT};
use atelier_storage::keys::destination_folder;
use atelier_storage::{BlobStore, ObjectMetadata, StorageKey};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Progress of one single-file upload.
#[derive(Debug)]
enum AttemptState {
    Attempting(u32),
    Succeeded(AccessLocator),
    Failed(UploadError),
}

/// Upload orchestration on top of a blob store.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    config: UploadConfig,
    policy: RetryPolicy,
    /// Last millisecond handed out for a key, shared by clones.
    last_key_millis: Arc<AtomicI64>,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>, config: UploadConfig) -> Self {
        let policy = RetryPolicy::from_config(&config);
        Self {
            store,
            config,
            policy,
            last_key_millis: Arc::new(AtomicI64::new(i64::MIN)),
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Upload one file with the configured attempt budget.
    pub async fn upload(&self, request: &UploadRequest) -> UploadResult<AccessLocator> {
        self.upload_with_attempts(request, self.policy.max_attempts)
            .await
    }

    /// Upload one file, trying at most `max_attempts` times.
    ///
    /// Only `NetworkBlocked` failures are retried. Every attempt gets a fresh
    /// key timestamp, strictly greater than any this service handed out
    /// before, so a retry never overwrites the object a previous attempt may
    /// have left behind.
    #[tracing::instrument(
        skip(self, request),
        fields(file_name = %request.original_name(), folder = %request.destination_folder())
    )]
    pub async fn upload_with_attempts(
        &self,
        request: &UploadRequest,
        max_attempts: u32,
    ) -> UploadResult<AccessLocator> {
        if request.payload().is_empty() {
            return Err(UploadError::InvalidInput(format!(
                "File {} is empty",
                request.original_name()
            )));
        }
        if max_attempts == 0 {
            return Err(UploadError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        destination_folder(request.destination_folder())?;

        let policy = self.policy.with_max_attempts(max_attempts);
        let mut state = AttemptState::Attempting(1);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => match self.attempt_primary(request).await {
                    Ok(locator) => AttemptState::Succeeded(locator),
                    Err(err) if policy.should_retry(&err, attempt) => {
                        let delay = policy.backoff(attempt);
                        tracing::warn!(
                            error = %err,
                            attempt,
                            max_attempts,
                            backoff_ms = delay.as_millis() as u64,
                            "Upload attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        AttemptState::Attempting(attempt + 1)
                    }
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            attempt,
                            max_attempts,
                            "Upload failed"
                        );
                        AttemptState::Failed(err)
                    }
                },
                AttemptState::Succeeded(locator) => return Ok(locator),
                AttemptState::Failed(err) => return Err(err),
            };
        }
    }

    /// One write plus read-back on the primary key scheme.
    async fn attempt_primary(&self, request: &UploadRequest) -> UploadResult<AccessLocator> {
        let now = Utc::now();
        let key = StorageKey::primary(
            request.destination_folder(),
            self.next_key_timestamp(now),
            request.original_name(),
        )?;
        let metadata = base_metadata(request, now);
        self.write_and_resolve(&key, request, &metadata).await
    }

    /// Millisecond timestamp for a new key: `now`, or one past the previous
    /// key timestamp if the clock has not moved on.
    pub(crate) fn next_key_timestamp(&self, now: DateTime<Utc>) -> i64 {
        let now_ms = now.timestamp_millis();
        let previous = self
            .last_key_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_ms.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now_ms.max(previous.saturating_add(1))
    }

    pub(crate) async fn write_and_resolve(
        &self,
        key: &StorageKey,
        request: &UploadRequest,
        metadata: &ObjectMetadata,
    ) -> UploadResult<AccessLocator> {
        let start = std::time::Instant::now();
        let object = self
            .store
            .write(key.as_str(), request.payload().clone(), metadata)
            .await?;
        let locator = self.store.resolve_access_locator(&object).await?;

        tracing::info!(
            key = %key,
            size_bytes = object.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File stored"
        );

        Ok(locator)
    }
}

/// Content type, original name and upload time.
pub(crate) fn base_metadata(request: &UploadRequest, uploaded_at: DateTime<Utc>) -> ObjectMetadata {
    ObjectMetadata::new(request.mime_type())
        .with(META_ORIGINAL_NAME, request.original_name())
        .with(
            META_UPLOADED_AT,
            uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{FailureKind, UploadFile};
    use atelier_storage::MemoryStorage;

    fn service(store: MemoryStorage) -> UploadService {
        UploadService::new(Arc::new(store), UploadConfig::default())
    }

    #[tokio::test]
    async fn stores_under_folder_with_metadata() {
        let store = MemoryStorage::new();
        let service = service(store.clone());
        let request = UploadRequest::new(
            UploadFile::new(b"png".to_vec(), "red chair.png", "image/png"),
            "products",
        );

        let locator = service.upload(&request).await.unwrap();
        assert!(locator.as_str().starts_with("memory://atelier/products%2F"));
        assert!(locator.as_str().ends_with("_red_chair.png"));

        let keys = store.keys().await;
        assert_eq!(keys.len(), 1);
        let (_, metadata) = store.get(&keys[0]).await.unwrap();
        assert_eq!(metadata.content_type, "image/png");
        assert_eq!(metadata.get(META_ORIGINAL_NAME), Some("red chair.png"));
        let uploaded_at = metadata.get(META_UPLOADED_AT).unwrap();
        assert!(DateTime::parse_from_rfc3339(uploaded_at).is_ok());
    }

    #[tokio::test]
    async fn empty_payload_is_invalid_input() {
        let store = MemoryStorage::new();
        let service = service(store.clone());
        let request = UploadRequest::new(
            UploadFile::new(Vec::<u8>::new(), "empty.png", "image/png"),
            "products",
        );

        let err = service.upload(&request).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn zero_attempts_is_invalid_input() {
        let service = service(MemoryStorage::new());
        let request = UploadRequest::new(
            UploadFile::new(b"x".to_vec(), "a.png", "image/png"),
            "products",
        );

        let err = service.upload_with_attempts(&request, 0).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidInput);
    }

    #[test]
    fn key_timestamps_strictly_increase_within_one_millisecond() {
        let service = service(MemoryStorage::new());
        let now = Utc::now();

        let first = service.next_key_timestamp(now);
        let second = service.next_key_timestamp(now);
        let third = service.clone().next_key_timestamp(now);

        assert_eq!(first, now.timestamp_millis());
        assert_eq!(second, first + 1);
        assert_eq!(third, first + 2);

        let later = now + chrono::Duration::milliseconds(50);
        assert_eq!(service.next_key_timestamp(later), later.timestamp_millis());
    }
}
