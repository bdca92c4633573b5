use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or answered with a server-side failure.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A unique constraint rejected the write.
    #[error("conflicting row in `{table}`: {message}")]
    Conflict { table: String, message: String },
    /// The backend refused the request (bad filter, constraint, permissions).
    #[error("request on `{table}` rejected: {message}")]
    Rejected { table: String, message: String },
    /// A row could not be decoded into the expected model.
    #[error("failed to decode row from `{table}`")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a decode error for `table`.
    pub fn decode(table: &str, source: serde_json::Error) -> Self {
        StorageError::Decode {
            table: table.to_owned(),
            source,
        }
    }

    /// Whether the failure was caused by a unique constraint.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}
