use std::sync::Arc;

use async_trait::async_trait;
use common::{ArticleId, UserId};

use crate::{Record, Result};

/// Core trait for soft-delete store implementations.
///
/// Scoped reads skip soft-deleted rows. Unscoped reads include them, which
/// lets callers tell "never existed" apart from "exists but deleted".
///
/// Bulk operations keyed by user or article are idempotent: matching zero rows
/// is a success, and they report how many rows changed.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SoftDeleteStore<R: Record>: Send + Sync {
    /// Inserts a new row.
    ///
    /// Fails with `Conflict` if the id is taken, or if `R::UNIQUE_PER_KEYS`
    /// holds and an active row already exists for the same pair.
    async fn create(&self, record: R) -> Result<R>;

    /// Loads an active row by id. Soft-deleted rows are `NotFound`.
    async fn get_by_id(&self, id: R::Id) -> Result<R>;

    /// Loads the earliest row for a pair, active or soft-deleted.
    ///
    /// Returns `None` when no row has ever existed for the pair.
    async fn get_by_keys_unscoped(&self, user_id: UserId, article_id: ArticleId)
    -> Result<Option<R>>;

    /// Lists the active rows of a user, oldest first.
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<R>>;

    /// Lists the active rows of an article, oldest first.
    async fn find_by_article_id(&self, article_id: ArticleId) -> Result<Vec<R>>;

    /// Rewrites the mutable fields of an active row and bumps `updated_at`.
    async fn update(&self, record: R) -> Result<R>;

    /// Clears the deletion marker of a row, bumps `updated_at` and returns
    /// the now-active row.
    ///
    /// Fails with `NotFound` only when no row with that id exists at all.
    async fn restore(&self, id: R::Id) -> Result<R>;

    /// Soft-deletes an active row by id.
    async fn delete_by_id(&self, id: R::Id) -> Result<()>;

    /// Soft-deletes the active rows of a `(user, article)` pair.
    async fn delete_by_keys(&self, user_id: UserId, article_id: ArticleId) -> Result<u64>;

    /// Soft-deletes every active row of a user.
    async fn delete_by_user_id(&self, user_id: UserId) -> Result<u64>;

    /// Soft-deletes every active row of an article.
    async fn delete_by_article_id(&self, article_id: ArticleId) -> Result<u64>;

    /// Restores every soft-deleted row of a user.
    async fn restore_by_user_id(&self, user_id: UserId) -> Result<u64>;

    /// Restores every soft-deleted row of an article.
    async fn restore_by_article_id(&self, article_id: ArticleId) -> Result<u64>;
}

// Lets `Arc<dyn SoftDeleteStore<R>>` be injected wherever a store is expected.
#[async_trait]
impl<R, S> SoftDeleteStore<R> for Arc<S>
where
    R: Record,
    S: SoftDeleteStore<R> + ?Sized,
{
    async fn create(&self, record: R) -> Result<R> {
        (**self).create(record).await
    }

    async fn get_by_id(&self, id: R::Id) -> Result<R> {
        (**self).get_by_id(id).await
    }

    async fn get_by_keys_unscoped(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<Option<R>> {
        (**self).get_by_keys_unscoped(user_id, article_id).await
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<R>> {
        (**self).find_by_user_id(user_id).await
    }

    async fn find_by_article_id(&self, article_id: ArticleId) -> Result<Vec<R>> {
        (**self).find_by_article_id(article_id).await
    }

    async fn update(&self, record: R) -> Result<R> {
        (**self).update(record).await
    }

    async fn restore(&self, id: R::Id) -> Result<R> {
        (**self).restore(id).await
    }

    async fn delete_by_id(&self, id: R::Id) -> Result<()> {
        (**self).delete_by_id(id).await
    }

    async fn delete_by_keys(&self, user_id: UserId, article_id: ArticleId) -> Result<u64> {
        (**self).delete_by_keys(user_id, article_id).await
    }

    async fn delete_by_user_id(&self, user_id: UserId) -> Result<u64> {
        (**self).delete_by_user_id(user_id).await
    }

    async fn delete_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        (**self).delete_by_article_id(article_id).await
    }

    async fn restore_by_user_id(&self, user_id: UserId) -> Result<u64> {
        (**self).restore_by_user_id(user_id).await
    }

    async fn restore_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        (**self).restore_by_article_id(article_id).await
    }
}
