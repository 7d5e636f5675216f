//! Shared types for the bookmark and comment services.

pub mod types;

pub use types::{ArticleId, BookmarkId, CommentId, UserId};
