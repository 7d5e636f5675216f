//! Saga type and step name constants.

/// Saga type: bookmark an article.
pub const CREATE_BOOKMARK: &str = "CreateBookmark";

/// Saga type: remove a bookmark.
pub const DELETE_BOOKMARK: &str = "DeleteBookmark";

/// Step name: increment the article's bookmark counter.
pub const STEP_INCREMENT_COUNT: &str = "increment_count";

/// Step name: restore the previous bookmark row or insert a new one.
pub const STEP_SAVE_BOOKMARK: &str = "save_bookmark";

/// Step name: decrement the article's bookmark counter.
pub const STEP_DECREMENT_COUNT: &str = "decrement_count";

/// Step name: soft-delete the bookmark row.
pub const STEP_SOFT_DELETE_BOOKMARK: &str = "soft_delete_bookmark";
