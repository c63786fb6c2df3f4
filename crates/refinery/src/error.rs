//! Error types for the Refinery library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Refinery operations.
///
/// Expression parsing and function evaluation never produce one of these:
/// malformed expressions degrade to identity and function faults return the
/// original value. Only store-level validation and I/O surface as errors.
#[derive(Debug, Error)]
pub enum RefineryError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no data to work with.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Failure saving or loading a transformation ledger.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A transformation or dataset id that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An active transformation with the same function already exists on the column.
    #[error("Function '{function}' is already applied to column '{column}'")]
    DuplicateFunctionOnColumn { column: String, function: String },

    /// A reorder request whose ids do not match the column's active chain.
    #[error(
        "Reorder of column '{column}' must list every active transformation exactly once \
         (expected {expected}, received {received})"
    )]
    IncompleteReorderSet {
        column: String,
        expected: usize,
        received: usize,
    },

    /// An update that would leave a transformation in an invalid state.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Refinery operations.
pub type Result<T> = std::result::Result<T, RefineryError>;
