//! Storage error types
//!
//! Defines all errors that can occur in the series store.

use thiserror::Error;

/// Errors that can occur in the series store
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested series does not exist
    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    /// Series name is empty or malformed
    #[error("Invalid series name: {0:?}")]
    InvalidName(String),

    /// Step must be a positive number of seconds
    #[error("Invalid step for {name}: {step}s")]
    InvalidStep { name: String, step: i64 },

    /// Timestamp cannot be aligned to a slot end
    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    /// Invalid time range (from > until)
    #[error("Invalid time range: from must not be after until")]
    InvalidTimeRange,

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        StorageError::Lock(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
