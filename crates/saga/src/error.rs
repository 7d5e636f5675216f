//! Saga error types.

use store::StoreError;
use thiserror::Error;

use crate::services::CounterError;
use crate::state::SagaState;

/// Errors that can occur during saga operations.
///
/// A failed compensation is not represented here. The caller receives the
/// error of the step that triggered compensation; the inconsistency is only
/// reported through logs and metrics.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Saga is in an invalid state for the requested operation.
    #[error("Invalid saga state: expected {expected}, actual {actual}")]
    InvalidState { expected: String, actual: SagaState },

    /// A remote counter call could not be completed.
    #[error("Remote call failed: {0}")]
    Remote(#[from] CounterError),

    /// A local persistence step failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl SagaError {
    /// Returns true if the error came from a remote call.
    pub fn is_remote(&self) -> bool {
        matches!(self, SagaError::Remote(_))
    }

    /// Returns true if the error came from local storage.
    pub fn is_storage(&self) -> bool {
        matches!(self, SagaError::Storage(_))
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
