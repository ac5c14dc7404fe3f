//! Storage key naming and access locator parsing.
//!
//! Keys are derived from the upload time in milliseconds and a sanitized copy
//! of the client file name. There is no random component: two uploads of the
//! same name within one millisecond from different sessions map to the same key.
//! Primary keys always carry a folder, fallback keys never do.

use crate::traits::{StorageError, StorageResult};
use atelier_core::AccessLocator;
use std::fmt;

const MAX_FILENAME_LENGTH: usize = 255;
const EMPTY_NAME_PLACEHOLDER: &str = "file";

/// Location of a blob inside the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Primary key scheme: `{folder}/{timestamp_ms}_{sanitized_name}`.
    ///
    /// The folder must keep at least one segment after normalization, so a
    /// primary key never collides with the fallback scheme.
    pub fn primary(folder: &str, timestamp_ms: i64, original_name: &str) -> StorageResult<Self> {
        let folder = destination_folder(folder)?;
        Ok(StorageKey(format!(
            "{}/{}_{}",
            folder,
            timestamp_ms,
            sanitize_filename(original_name)
        )))
    }

    /// Fallback key scheme: `{timestamp_ms}_{sanitized_name}` with no folder.
    pub fn fallback(timestamp_ms: i64, original_name: &str) -> Self {
        StorageKey(format!("{}_{}", timestamp_ms, sanitize_filename(original_name)))
    }

    /// Recover the key from an access locator.
    ///
    /// Takes the final path segment, strips query and fragment, and
    /// percent-decodes it.
    pub fn from_access_locator(locator: &str) -> StorageResult<Self> {
        let without_fragment = locator.split('#').next().unwrap_or_default();
        let without_query = without_fragment.split('?').next().unwrap_or_default();
        let segment = without_query
            .rsplit('/')
            .next()
            .unwrap_or_default();

        if segment.is_empty() {
            return Err(StorageError::InvalidKey(format!(
                "No storage key in access locator: {}",
                locator
            )));
        }

        let decoded = urlencoding::decode(segment).map_err(|e| {
            StorageError::InvalidKey(format!("Access locator is not valid UTF-8: {}", e))
        })?;

        validate_key(&decoded)?;
        Ok(StorageKey(decoded.into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitize a client file name into a single safe key segment.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `_`, and `..` sequences are broken up.
pub fn sanitize_filename(filename: &str) -> String {
    let filename_only = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let mapped: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = mapped.replace("..", "_");
    if sanitized.is_empty() || sanitized == "." {
        EMPTY_NAME_PLACEHOLDER.to_string()
    } else {
        sanitized
    }
}

/// Normalize a destination folder, rejecting one with no usable segment.
///
/// Empty, `.` and `..` segments are dropped; `""`, `"/"` and `"../.."` are
/// all rejected.
pub fn destination_folder(folder: &str) -> StorageResult<String> {
    let normalized = folder
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(sanitize_filename)
        .collect::<Vec<_>>()
        .join("/");

    if normalized.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "Destination folder has no usable segment: {:?}",
            folder
        )));
    }
    Ok(normalized)
}

/// Reject keys that could escape a backend's namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Build the access locator for `key` under `base_url`.
pub fn access_locator(base_url: &str, key: &str) -> AccessLocator {
    AccessLocator::new(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(key)
    ))
}
