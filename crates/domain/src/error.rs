//! Domain error types.

use common::{CommentId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The acting user does not own the comment.
    #[error("User {user_id} does not own comment {comment_id}")]
    NotOwner {
        comment_id: CommentId,
        user_id: UserId,
    },
}
