use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use common::{ArticleId, UserId};

/// A row that can be soft-deleted and restored.
///
/// Every record hangs off two foreign keys owned by other services: the user
/// and the article. Bulk deletion and restoration are keyed by either of them.
///
/// The `mark_*` and `apply_update` methods exist for store implementations.
/// Business code reads the marker through `deleted_at` but never sets it.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    /// Identifier type of the record.
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Entity name used in errors and logs.
    const ENTITY: &'static str;

    /// Whether at most one active row may exist per `(user_id, article_id)`.
    const UNIQUE_PER_KEYS: bool;

    fn id(&self) -> Self::Id;

    fn user_id(&self) -> UserId;

    fn article_id(&self) -> ArticleId;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// When the row was soft-deleted, if it is currently deleted.
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Returns true if the row is soft-deleted.
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    /// Returns true if the row belongs to the given `(user, article)` pair.
    fn matches_keys(&self, user_id: UserId, article_id: ArticleId) -> bool {
        self.user_id() == user_id && self.article_id() == article_id
    }

    /// Sets the deletion marker. `updated_at` is left untouched.
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    /// Clears the deletion marker and bumps `updated_at`.
    fn mark_restored(&mut self, at: DateTime<Utc>);

    /// Copies the mutable fields of `changes` into `self` and bumps `updated_at`.
    ///
    /// Identity, foreign keys, `created_at` and the marker are preserved.
    fn apply_update(&mut self, changes: &Self, at: DateTime<Utc>);
}
