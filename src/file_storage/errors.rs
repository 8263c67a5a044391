//! # File Storage Errors

use std::io;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
///
/// Validation variants render the exact message returned to clients.
/// Backend variants carry detail for the logs only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    // Validation errors
    #[error("No file provided")]
    NoFile,

    #[error("Unsupported file type")]
    UnsupportedMimeType(String),

    #[error("{0}")]
    MissingField(&'static str),

    #[error("Refusing to operate on an empty prefix")]
    EmptyPrefix,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // Object errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    // Signed URL errors
    #[error("URL expired")]
    UrlExpired,

    #[error("Invalid signature")]
    InvalidSignature,

    // Backend errors
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid continuation token")]
    InvalidContinuationToken,

    #[error("Listing page limit exceeded after {0} pages")]
    PageLimitExceeded(usize),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::NoFile => 400,
            StorageError::UnsupportedMimeType(_) => 400,
            StorageError::MissingField(_) => 400,
            StorageError::EmptyPrefix => 400,
            StorageError::InvalidKey(_) => 400,
            StorageError::ObjectNotFound(_) => 404,
            StorageError::UrlExpired => 403,
            StorageError::InvalidSignature => 403,
            StorageError::Unavailable(_) => 500,
            StorageError::PermissionDenied(_) => 500,
            StorageError::InvalidContinuationToken => 500,
            StorageError::PageLimitExceeded(_) => 500,
            StorageError::Internal(_) => 500,
        }
    }

    /// True when the caller supplied bad input and nothing was attempted
    pub fn is_validation(&self) -> bool {
        self.status_code() == 400
    }

    /// Map an I/O error from a filesystem-backed store
    pub fn from_io(context: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => StorageError::ObjectNotFound(context.to_string()),
            io::ErrorKind::PermissionDenied => {
                StorageError::PermissionDenied(format!("{}: {}", context, err))
            }
            _ => StorageError::Unavailable(format!("{}: {}", context, err)),
        }
    }
}
