//! Error types for the storage layer.

use std::sync::PoisonError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed identifier or path.
    #[error(transparent)]
    Types(#[from] arbor_types::Error),

    /// Invalid data, including poisoned locks.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(e: PoisonError<T>) -> Self {
        Self::InvalidData(format!("lock poisoned: {e}"))
    }
}
