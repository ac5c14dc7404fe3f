use crate::keys::{access_locator, validate_key};
use crate::traits::{BlobStore, ObjectMetadata, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use atelier_core::AccessLocator;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const METADATA_SUFFIX: &str = ".meta.json";

/// Local filesystem storage implementation
///
/// Each object is a plain file under `base_path`; its metadata sits next to it
/// in a `<file>.meta.json` sidecar.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/atelier/uploads")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys that would resolve outside the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        if storage_key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        if let (Ok(canonical), Ok(base_canonical)) =
            (path.canonicalize(), self.base_path.canonicalize())
        {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn metadata_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(METADATA_SUFFIX);
        PathBuf::from(name)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Read back the metadata stored alongside `storage_key`.
    pub async fn read_metadata(&self, storage_key: &str) -> StorageResult<ObjectMetadata> {
        let path = self.key_to_path(storage_key)?;
        let raw = match fs::read(Self::metadata_path(&path)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|e| {
            StorageError::Rejected(format!("Corrupt metadata for {}: {}", storage_key, e))
        })
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn write(
        &self,
        key: &str,
        data: Bytes,
        metadata: &ObjectMetadata,
    ) -> StorageResult<StoredObject> {
        let path = self.key_to_path(key)?;
        let size = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;

        let sidecar = serde_json::to_vec(metadata).map_err(|e| {
            StorageError::Rejected(format!("Failed to encode metadata for {}: {}", key, e))
        })?;
        fs::write(Self::metadata_path(&path), sidecar).await?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(StoredObject {
            key: key.to_string(),
            size_bytes: size,
        })
    }

    async fn resolve_access_locator(&self, object: &StoredObject) -> StorageResult<AccessLocator> {
        let path = self.key_to_path(&object.key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(object.key.clone()));
        }

        Ok(access_locator(&self.base_url, &object.key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        fs::remove_file(&path).await?;

        let sidecar = Self::metadata_path(&path);
        if let Err(e) = fs::remove_file(&sidecar).await {
            tracing::debug!(
                error = %e,
                path = %sidecar.display(),
                "Metadata sidecar not removed"
            );
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use crate::traits::META_ORIGINAL_NAME;
    use crate::StorageKey;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:3000/storage".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_write_and_resolve() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let metadata = ObjectMetadata::new("image/png").with(META_ORIGINAL_NAME, "chair.png");
        let object = storage
            .write("products/1_chair.png", Bytes::from_static(b"png"), &metadata)
            .await
            .unwrap();

        assert_eq!(object.size_bytes, 3);
        assert!(dir.path().join("products/1_chair.png").exists());

        let locator = storage.resolve_access_locator(&object).await.unwrap();
        assert_eq!(
            locator.as_str(),
            "http://localhost:3000/storage/products%2F1_chair.png"
        );
        assert_eq!(
            StorageKey::from_access_locator(locator.as_str())
                .unwrap()
                .as_str(),
            "products/1_chair.png"
        );

        let stored = storage.read_metadata("products/1_chair.png").await.unwrap();
        assert_eq!(stored, metadata);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage
            .write("../escape.txt", Bytes::from_static(b"x"), &ObjectMetadata::default())
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        storage
            .write("a/1_x.glb", Bytes::from_static(b"glTF"), &ObjectMetadata::default())
            .await
            .unwrap();
        storage.delete("a/1_x.glb").await.unwrap();

        assert!(!dir.path().join("a/1_x.glb").exists());
        assert!(!dir.path().join("a/1_x.glb.meta.json").exists());
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete("nonexistent/file.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_missing_object() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage
            .resolve_access_locator(&StoredObject {
                key: "missing.png".to_string(),
                size_bytes: 0,
            })
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
