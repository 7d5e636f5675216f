//! Domain layer for the bookmark and comment services.
//!
//! This crate provides the two soft-deletable aggregates:
//! - `Bookmark`, at most one active per (user, article)
//! - `Comment`, with a plain CRUD service
//!
//! Both implement the store's `Record` and `PgRecord` contracts.

pub mod bookmark;
pub mod comment;
pub mod error;

pub use bookmark::Bookmark;
pub use comment::{Comment, CommentService};
pub use error::DomainError;
