//! Error types for the store module.

use profile_guard_core::{CoreError, DataKey};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Parallel key/value lists of different lengths.
    #[error("length mismatch: {keys} keys, {values} values")]
    LengthMismatch { keys: usize, values: usize },

    /// A stored value does not decode as the type its key implies.
    #[error("invalid value at {key}: {source}")]
    InvalidValue {
        key: DataKey,
        #[source]
        source: CoreError,
    },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
