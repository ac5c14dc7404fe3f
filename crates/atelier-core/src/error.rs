//! Error types module
//!
//! `UploadError` is the caller-facing failure of every upload operation. Each
//! variant maps onto one of the four failure kinds the upload subsystem
//! distinguishes, and self-describes through `ErrorMetadata` so UI handlers can
//! decide what to show without matching on variants.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like blocked requests
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Classified failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Empty or missing file, disallowed extension, bad parameters. Never retried.
    InvalidInput,
    /// Cross-origin rejection, failed fetch or an unknown transport error.
    /// Retried inside a single-file operation and eligible for the fallback path.
    NetworkBlocked,
    /// Quota, auth or validation error returned by the remote store.
    RemoteRejected,
    /// A batch stopped at its first failed file.
    BatchAborted,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "NETWORK_BLOCKED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried by the caller)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Caller-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid format for {file_name}: allowed extensions are {}", .allowed.join(", "))]
    InvalidFormat {
        file_name: String,
        allowed: Vec<String>,
    },

    #[error("Network blocked: {0}")]
    NetworkBlocked(String),

    #[error("Remote store rejected the upload: {0}")]
    RemoteRejected(String),

    #[error("{}", storage_unavailable_message(.file_name, .fallback_attempted))]
    StorageUnavailable {
        file_name: String,
        fallback_attempted: bool,
        #[source]
        source: Box<UploadError>,
    },

    #[error("Upload of {file_name} failed, batch aborted: {source}")]
    BatchAborted {
        file_name: String,
        #[source]
        source: Box<UploadError>,
    },
}

fn storage_unavailable_message(file_name: &str, fallback_attempted: &bool) -> String {
    if *fallback_attempted {
        format!(
            "Unable to store {}: the upload was blocked on the primary path and the fallback path also failed",
            file_name
        )
    } else {
        format!("Unable to store {}: the remote store refused the upload", file_name)
    }
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl UploadError {
    /// Classified kind of this failure.
    ///
    /// `StorageUnavailable` reports the kind of the failure it wraps, so a
    /// rejected primary upload stays `RemoteRejected` after the fallback
    /// selector has turned it into an actionable message.
    pub fn kind(&self) -> FailureKind {
        match self {
            UploadError::InvalidInput(_) | UploadError::InvalidFormat { .. } => {
                FailureKind::InvalidInput
            }
            UploadError::NetworkBlocked(_) => FailureKind::NetworkBlocked,
            UploadError::RemoteRejected(_) => FailureKind::RemoteRejected,
            UploadError::StorageUnavailable { source, .. } => source.kind(),
            UploadError::BatchAborted { .. } => FailureKind::BatchAborted,
        }
    }

    /// Whether a single-file operation may try again after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::NetworkBlocked(_))
    }

    /// Name of the file that aborted a batch, if this is a batch failure.
    pub fn failed_file(&self) -> Option<&str> {
        match self {
            UploadError::BatchAborted { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// Innermost classified failure, skipping batch and fallback wrappers.
    pub fn root_cause(&self) -> &UploadError {
        match self {
            UploadError::StorageUnavailable { source, .. }
            | UploadError::BatchAborted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::InvalidInput(_) => "INVALID_INPUT",
            UploadError::InvalidFormat { .. } => "INVALID_FORMAT",
            UploadError::NetworkBlocked(_) => "NETWORK_BLOCKED",
            UploadError::RemoteRejected(_) => "REMOTE_REJECTED",
            UploadError::StorageUnavailable { .. } => "STORAGE_UNAVAILABLE",
            UploadError::BatchAborted { .. } => "BATCH_ABORTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self.kind() {
            FailureKind::NetworkBlocked => true,
            FailureKind::InvalidInput | FailureKind::RemoteRejected => false,
            FailureKind::BatchAborted => self.root_cause().is_recoverable(),
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self.root_cause() {
            UploadError::InvalidInput(_) => Some("Check the selected file and try again"),
            UploadError::InvalidFormat { .. } => Some("Choose a file with a supported extension"),
            UploadError::NetworkBlocked(_) => {
                Some("Check the network connection and storage CORS settings, then retry")
            }
            UploadError::RemoteRejected(_) => {
                Some("Check storage quota and credentials before retrying")
            }
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        self.to_string()
    }

    fn log_level(&self) -> LogLevel {
        match self.kind() {
            FailureKind::InvalidInput => LogLevel::Debug,
            FailureKind::NetworkBlocked => LogLevel::Warn,
            FailureKind::RemoteRejected | FailureKind::BatchAborted => LogLevel::Error,
        }
    }
}
