//! Shared application state.

use std::sync::Arc;

use domain::{Bookmark, Comment, CommentService};
use saga::{BookmarkCoordinator, CascadeParticipant, CounterService};
use store::SoftDeleteStore;

pub type BookmarkStore = Arc<dyn SoftDeleteStore<Bookmark>>;
pub type CommentStore = Arc<dyn SoftDeleteStore<Comment>>;
pub type Counter = Arc<dyn CounterService>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub bookmarks: BookmarkCoordinator<BookmarkStore, Counter>,
    pub comments: CommentService<CommentStore>,
    pub bookmark_cascade: CascadeParticipant<Bookmark, BookmarkStore>,
    pub comment_cascade: CascadeParticipant<Comment, CommentStore>,
}

impl AppState {
    /// Wires the coordinator, the comment service and both cascade
    /// participants onto the given backends.
    pub fn new(bookmark_store: BookmarkStore, comment_store: CommentStore, counter: Counter) -> Self {
        Self {
            bookmarks: BookmarkCoordinator::new(Arc::clone(&bookmark_store), counter),
            comments: CommentService::new(Arc::clone(&comment_store)),
            bookmark_cascade: CascadeParticipant::new(bookmark_store),
            comment_cascade: CascadeParticipant::new(comment_store),
        }
    }
}
