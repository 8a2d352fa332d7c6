use thiserror::Error;
use uuid::Uuid;

use crate::Version;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrency conflict occurred when saving.
    /// The expected version did not match the stored version.
    #[error("Concurrency conflict for {kind} {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        kind: String,
        id: Uuid,
        expected: Version,
        actual: Version,
    },

    /// The document was not found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: Uuid },

    /// A unique key is already claimed by another document.
    #[error("{scope} {key} is already in use")]
    DuplicateKey { scope: String, key: String },

    /// The save request itself was malformed.
    #[error("Invalid save: {0}")]
    InvalidSave(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
