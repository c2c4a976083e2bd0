//! Error types for filedepot.

use thiserror::Error;

/// Common error type for filedepot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database backend.
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file with the same name already exists for this owner and no
    /// replacement was requested.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The filename extension is not in the accepted set.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// Deleting the prior blob during replacement failed. The prior record
    /// is left intact.
    #[error("replace failed: {0}")]
    ReplaceFailed(String),

    /// Writing the new blob to the storage backend failed. No metadata
    /// record was created.
    #[error("storage write failed: {0}")]
    StorageWrite(String),

    /// Inserting the metadata record failed after the blob was written.
    /// The blob is cleaned up best-effort before this error surfaces.
    #[error("metadata write failed: {0}")]
    MetadataWrite(String),

    /// Resource not found, or not visible to the requesting owner.
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for DepotError {
    fn from(e: sqlx::Error) -> Self {
        DepotError::Database(e.to_string())
    }
}

/// Result type alias for filedepot operations.
pub type Result<T> = std::result::Result<T, DepotError>;
