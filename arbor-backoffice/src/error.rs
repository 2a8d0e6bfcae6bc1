//! Error types for the back-office core.
//!
//! Only not-found conditions, unsupported requests and infrastructure
//! faults surface here. Validation problems and domain-rule failures are
//! reported through typed outcomes instead.

use arbor_storage::StorageError;
use arbor_types::EntityKind;
use thiserror::Error;

/// Result type for back-office operations.
pub type BackofficeResult<T> = Result<T, BackofficeError>;

/// Errors that can occur in back-office operations.
#[derive(Debug, Error)]
pub enum BackofficeError {
    /// A required entity, content type or parent does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The acting user may not perform the operation at all.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The operation is not available for the requested kind.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Page number and size must both be at least 1.
    #[error("invalid paging: page {page_number}, size {page_size}")]
    InvalidPaging { page_number: i64, page_size: i64 },

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// File system failure while handling uploads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed identifier.
    #[error(transparent)]
    Types(#[from] arbor_types::Error),

    /// Configuration could not be used.
    #[error("configuration error: {0}")]
    Config(String),
}

impl BackofficeError {
    pub fn not_found(kind: impl ToString, id: impl ToString) -> Self {
        Self::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        }
    }

    pub fn not_supported_kind(kind: EntityKind, operation: &str) -> Self {
        Self::NotSupported(format!("{operation} is not supported for {kind}"))
    }
}
