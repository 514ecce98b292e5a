//! Error types for the world clock core

use thiserror::Error;

/// Main error type for world clock operations
#[derive(Error, Debug)]
pub enum ClockError {
    /// Timezone identifier is not in the timezone database
    #[error("Invalid timezone identifier: {0}")]
    InvalidTimezone(String),

    /// Slider position outside the minutes-of-day range
    #[error("Slider position {0} is outside 0..=1439")]
    SliderOutOfRange(i64),

    /// Entry was not found in the timezone set
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// Removal would break a collection invariant
    #[error("Removal refused: {0}")]
    RemovalRefused(String),

    /// Error during storage operations (redb)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Remote sync endpoint failed or was unreachable
    #[error("Network error: {0}")]
    Network(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid operation for current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for ClockError {
    fn from(err: serde_json::Error) -> Self {
        ClockError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ClockError {
    fn from(err: reqwest::Error) -> Self {
        ClockError::Network(err.to_string())
    }
}

/// Result type alias using ClockError
pub type ClockResult<T> = Result<T, ClockError>;
