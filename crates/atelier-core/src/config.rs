//! Configuration module
//!
//! Upload pacing, retry and storage backend settings, read from the
//! environment (and a `.env` file when present).

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 1000;
const BATCH_DELAY_MS: u64 = 500;
const FALLBACK_BATCH_DELAY_MS: u64 = 1000;
const DEFAULT_FOLDER: &str = "products";
const MODEL_FOLDER: &str = "models";
const MODEL_EXTENSIONS: &str = "glb,gltf";
const LOCAL_STORAGE_PATH: &str = "./data/uploads";
const LOCAL_STORAGE_BASE_URL: &str = "http://localhost:3000/storage";

/// Upload subsystem configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Attempts per single-file upload on the primary path (>= 1).
    pub max_attempts: u32,
    /// Backoff before attempt `n + 1` is `n * retry_base_delay`.
    pub retry_base_delay: Duration,
    /// Pause between two files of a direct batch.
    pub batch_delay: Duration,
    /// Pause between two files of a fallback-aware batch.
    pub fallback_batch_delay: Duration,
    pub default_folder: String,
    pub model_folder: String,
    /// Lowercase, without the leading dot.
    pub model_extensions: Vec<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, R2, etc.)
    pub local_storage_path: String,
    pub local_storage_base_url: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            batch_delay: Duration::from_millis(BATCH_DELAY_MS),
            fallback_batch_delay: Duration::from_millis(FALLBACK_BATCH_DELAY_MS),
            default_folder: DEFAULT_FOLDER.to_string(),
            model_folder: MODEL_FOLDER.to_string(),
            model_extensions: parse_list(MODEL_EXTENSIONS),
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: LOCAL_STORAGE_PATH.to_string(),
            local_storage_base_url: LOCAL_STORAGE_BASE_URL.to_string(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let max_attempts = env::var("UPLOAD_MAX_ATTEMPTS")
            .unwrap_or_else(|_| MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .unwrap_or(MAX_ATTEMPTS);

        let retry_base_delay_ms = parse_u64_or("UPLOAD_RETRY_BASE_DELAY_MS", RETRY_BASE_DELAY_MS);
        let batch_delay_ms = parse_u64_or("UPLOAD_BATCH_DELAY_MS", BATCH_DELAY_MS);
        let fallback_batch_delay_ms =
            parse_u64_or("UPLOAD_FALLBACK_BATCH_DELAY_MS", FALLBACK_BATCH_DELAY_MS);

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Local,
        };

        let model_extensions = parse_list(
            &env::var("UPLOAD_MODEL_EXTENSIONS").unwrap_or_else(|_| MODEL_EXTENSIONS.to_string()),
        );

        let config = UploadConfig {
            max_attempts,
            retry_base_delay: Duration::from_millis(retry_base_delay_ms),
            batch_delay: Duration::from_millis(batch_delay_ms),
            fallback_batch_delay: Duration::from_millis(fallback_batch_delay_ms),
            default_folder: env::var("UPLOAD_DEFAULT_FOLDER")
                .unwrap_or_else(|_| DEFAULT_FOLDER.to_string()),
            model_folder: env::var("UPLOAD_MODEL_FOLDER")
                .unwrap_or_else(|_| MODEL_FOLDER.to_string()),
            model_extensions,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|_| LOCAL_STORAGE_BASE_URL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_attempts == 0 {
            return Err(anyhow::anyhow!("UPLOAD_MAX_ATTEMPTS must be at least 1"));
        }

        if self.model_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "UPLOAD_MODEL_EXTENSIONS must list at least one extension"
            ));
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET is required when STORAGE_BACKEND=s3"
                ));
            }
            if self.s3_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION is required when STORAGE_BACKEND=s3"
                ));
            }
        }

        Ok(())
    }
}

fn parse_u64_or(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Split a comma-separated list, lowercasing entries and dropping leading dots.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = UploadConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_millis(1000));
        assert_eq!(config.batch_delay, Duration::from_millis(500));
        assert_eq!(config.fallback_batch_delay, Duration::from_millis(1000));
        assert_eq!(config.model_extensions, vec!["glb", "gltf"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_list_normalizes_entries() {
        assert_eq!(parse_list(" .GLB, gltf ,,"), vec!["glb", "gltf"]);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = UploadConfig {
            max_attempts: 0,
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn s3_backend_requires_bucket_and_region() {
        let mut config = UploadConfig {
            storage_backend: StorageBackend::S3,
            ..UploadConfig::default()
        };
        assert!(config.validate().is_err());

        config.s3_bucket = Some("assets".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }
}
