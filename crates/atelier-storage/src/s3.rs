use crate::keys::access_locator;
use crate::traits::{BlobStore, ObjectMetadata, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use atelier_core::AccessLocator;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload, RetryConfig,
};
use regex::Regex;
use std::borrow::Cow;
use std::error::Error;
use std::sync::OnceLock;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    base_url: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        Self::from_builder(AmazonS3Builder::from_env(), bucket, region, endpoint_url)
    }

    /// Finish a pre-configured builder (credentials, client options).
    ///
    /// object_store's own retries are switched off: every `write` is exactly
    /// one request, and the upload retry policy decides about the next one.
    pub fn from_builder(
        builder: AmazonS3Builder,
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = builder
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_retry(RetryConfig {
                max_retries: 0,
                ..Default::default()
            });

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let base_url = Self::base_url(&bucket, &region, endpoint_url.as_deref());

        Ok(S3Storage {
            store,
            bucket,
            base_url,
        })
    }

    /// Public base URL for objects in the bucket
    ///
    /// For AWS S3: https://{bucket}.s3.{region}.amazonaws.com
    /// For S3-compatible providers, path-style: {endpoint}/{bucket}
    fn base_url(bucket: &str, region: &str, endpoint_url: Option<&str>) -> String {
        match endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        }
    }

    fn attributes(metadata: &ObjectMetadata) -> Attributes {
        let mut attributes = Attributes::new();
        if !metadata.content_type.is_empty() {
            attributes.insert(Attribute::ContentType, metadata.content_type.clone().into());
        }
        for (name, value) in &metadata.custom {
            attributes.insert(
                Attribute::Metadata(Cow::Owned(name.clone())),
                value.clone().into(),
            );
        }
        attributes
    }
}

/// HTTP status line somewhere in an error message, e.g. "400 Bad Request".
fn status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([1-5][0-9]{2}) [A-Z][A-Za-z]").expect("static regex is valid")
    })
}

/// Status code of the HTTP answer behind `err`, if the store answered at all.
///
/// object_store folds most non-2xx answers into `Generic`, so the status is
/// only recoverable from the messages along the source chain.
fn answered_status(err: &(dyn Error + 'static)) -> Option<u16> {
    let mut current: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(status) = status_pattern()
            .captures(&e.to_string())
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u16>().ok())
        {
            return Some(status);
        }
        current = e.source();
    }
    None
}

/// Classify an object_store failure.
///
/// A 4xx answer (invalid metadata, quota, throttling, auth) is a rejection.
/// No answer at all (connect, timeout, reset) or a 5xx answer is transient.
fn classify(err: ObjectStoreError, key: &str) -> StorageError {
    match err {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
        ObjectStoreError::Generic { .. } => match answered_status(&err) {
            Some(status) if (400..500).contains(&status) => {
                StorageError::Rejected(err.to_string())
            }
            _ => StorageError::NetworkBlocked(err.to_string()),
        },
        ObjectStoreError::PermissionDenied { .. }
        | ObjectStoreError::Unauthenticated { .. }
        | ObjectStoreError::Precondition { .. }
        | ObjectStoreError::AlreadyExists { .. } => StorageError::Rejected(err.to_string()),
        other => StorageError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl BlobStore for S3Storage {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> StorageResult<StoredObject> {
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let options = PutOptions {
            attributes: Self::attributes(metadata),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result = object_store::ObjectStore::put_opts(
            &self.store,
            &location,
            PutPayload::from(data),
            options,
        )
        .await;

        result.map_err(|e| {
            let err = classify(e, key);
            tracing::error!(
                error = %err,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 write failed"
            );
            err
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 write successful"
        );

        Ok(StoredObject {
            key: key.to_string(),
            size_bytes: size,
        })
    }

    async fn resolve_access_locator(&self, object: &StoredObject) -> StorageResult<AccessLocator> {
        let location = Path::from(object.key.clone());

        self.store
            .head(&location)
            .await
            .map_err(|e| classify(e, &object.key))?;

        Ok(access_locator(&self.base_url, &object.key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        self.store
            .delete(&location)
            .await
            .map_err(|e| classify(e, storage_key))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
