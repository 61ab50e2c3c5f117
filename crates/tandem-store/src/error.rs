use thiserror::Error;

use tandem_shared::TandemError;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// The shared database mutex was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Blob storage failure.
    #[error("Blob storage error: {0}")]
    Blob(String),

    /// Blob exceeds the configured size cap.
    #[error("Blob too large: {size} bytes (max {max})")]
    BlobTooLarge { size: usize, max: usize },

    /// No blob stored under the given key.
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Blob key contains path separators or traversal components.
    #[error("Invalid blob key: {0}")]
    BadBlobKey(String),
}

impl From<StoreError> for TandemError {
    fn from(e: StoreError) -> Self {
        TandemError::Storage(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
