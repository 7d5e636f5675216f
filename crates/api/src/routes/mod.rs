//! HTTP route handlers.

pub mod bookmarks;
pub mod cascade;
pub mod comments;
pub mod metrics;
