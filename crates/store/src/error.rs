use thiserror::Error;

use crate::Record;

/// Errors that can occur when interacting with a soft-delete store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched an operation that targets a specific row.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The write would break a uniqueness constraint.
    #[error("{entity} conflict: {reason}")]
    Conflict {
        entity: &'static str,
        reason: String,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The backend refused to serve the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a `NotFound` error for a record type.
    pub fn not_found<R: Record>(id: impl ToString) -> Self {
        StoreError::NotFound {
            entity: R::ENTITY,
            id: id.to_string(),
        }
    }

    /// Creates a `Conflict` error for a record type.
    pub fn conflict<R: Record>(reason: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: R::ENTITY,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
