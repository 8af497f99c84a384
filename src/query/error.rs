//! Query error types
//!
//! Defines all error conditions that can occur during query parsing and execution.

use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Query parsing failed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Top-level expression is not a function call
    #[error("Expected a function call at top level, found {0}")]
    NotACall(String),

    /// Function is not known to the evaluator
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("{function}() expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },

    /// Argument has the wrong type
    #[error("{function}() argument {position}: {message}")]
    InvalidArgument {
        function: String,
        position: usize,
        message: String,
    },

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
