//! Upload domain models.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A client-selected file as handed over by the caller.
///
/// The payload is untrusted: neither its name nor its declared content type
/// has been checked yet.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Bytes,
    pub name: String,
    pub content_type: String,
}

impl UploadFile {
    pub fn new(
        data: impl Into<Bytes>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
            content_type: content_type.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One file bound to a destination folder.
///
/// Created per file when a batch starts and consumed by a single-file
/// operation. Fields are private so a request cannot change once built.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    payload: Bytes,
    original_name: String,
    mime_type: String,
    destination_folder: String,
}

impl UploadRequest {
    pub fn new(file: UploadFile, destination_folder: impl Into<String>) -> Self {
        Self {
            payload: file.data,
            original_name: file.name,
            mime_type: file.content_type,
            destination_folder: destination_folder.into(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn destination_folder(&self) -> &str {
        &self.destination_folder
    }

    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }
}

/// Durable URL of a stored blob, usable for later retrieval or deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLocator(String);

impl AccessLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AccessLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccessLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How each file of a batch is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStrategy {
    /// Primary path only, with retries.
    #[default]
    Direct,
    /// Primary path, then one attempt on the alternate key scheme when the
    /// primary path is blocked at the network level.
    WithFallback,
}
