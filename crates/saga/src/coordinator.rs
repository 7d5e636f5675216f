//! Bookmark workflow coordinator.

use async_trait::async_trait;
use common::{ArticleId, UserId};
use domain::Bookmark;
use store::{SoftDeleteStore, StoreError};

use crate::error::{Result, SagaError};
use crate::runner::{CompensatingAction, Saga};
use crate::services::{CounterOperation, CounterService};
use crate::workflows;

/// Undoes a committed counter mutation with its compensating operation.
struct UndoCounter<'c, C: CounterService> {
    counter: &'c C,
    operation: CounterOperation,
    article_id: ArticleId,
}

#[async_trait]
impl<'c, C: CounterService> CompensatingAction for UndoCounter<'c, C> {
    fn name(&self) -> &'static str {
        self.operation.as_str()
    }

    async fn execute(&self) -> Result<()> {
        self.counter
            .apply(self.operation, self.article_id)
            .await
            .map_err(SagaError::from)
    }
}

/// Orchestrates bookmark creation and deletion as two-step sagas.
///
/// Both workflows mutate the remote counter first and write the local row
/// second. A local failure triggers exactly one compensating counter call.
pub struct BookmarkCoordinator<S, C>
where
    S: SoftDeleteStore<Bookmark>,
    C: CounterService,
{
    store: S,
    counter: C,
}

impl<S, C> BookmarkCoordinator<S, C>
where
    S: SoftDeleteStore<Bookmark>,
    C: CounterService,
{
    /// Creates a new coordinator.
    pub fn new(store: S, counter: C) -> Self {
        Self { store, counter }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    /// Bookmarks an article for a user.
    ///
    /// A previously soft-deleted bookmark for the same pair is restored, so
    /// the returned row keeps its original identity. Calling this for a pair
    /// that is already bookmarked increments the counter again.
    #[tracing::instrument(skip(self), fields(saga_type = workflows::CREATE_BOOKMARK))]
    pub async fn create_bookmark(&self, user_id: UserId, article_id: ArticleId) -> Result<Bookmark> {
        let mut saga = Saga::new(workflows::CREATE_BOOKMARK);

        saga.step(
            workflows::STEP_INCREMENT_COUNT,
            self.counter.increment_count(article_id),
            UndoCounter {
                counter: &self.counter,
                operation: CounterOperation::DecrementCompensate,
                article_id,
            },
        )
        .await?;

        saga.finish(
            workflows::STEP_SAVE_BOOKMARK,
            self.save_bookmark(user_id, article_id),
        )
        .await
    }

    /// Removes a user's bookmark on an article.
    ///
    /// Fails with a storage `NotFound` (after compensating the counter) when
    /// the pair has no active bookmark.
    #[tracing::instrument(skip(self), fields(saga_type = workflows::DELETE_BOOKMARK))]
    pub async fn delete_bookmark(&self, user_id: UserId, article_id: ArticleId) -> Result<()> {
        let mut saga = Saga::new(workflows::DELETE_BOOKMARK);

        saga.step(
            workflows::STEP_DECREMENT_COUNT,
            self.counter.decrement_count(article_id),
            UndoCounter {
                counter: &self.counter,
                operation: CounterOperation::IncrementCompensate,
                article_id,
            },
        )
        .await?;

        saga.finish(
            workflows::STEP_SOFT_DELETE_BOOKMARK,
            self.soft_delete_bookmark(user_id, article_id),
        )
        .await
    }

    /// Lists a user's active bookmarks, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn bookmarks_for_user(&self, user_id: UserId) -> Result<Vec<Bookmark>> {
        Ok(self.store.find_by_user_id(user_id).await?)
    }

    async fn save_bookmark(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> store::Result<Bookmark> {
        match self.store.get_by_keys_unscoped(user_id, article_id).await? {
            Some(existing) => {
                tracing::debug!(bookmark_id = %existing.id(), "restoring existing bookmark");
                self.store.restore(existing.id()).await
            }
            None => self.store.create(Bookmark::new(user_id, article_id)).await,
        }
    }

    async fn soft_delete_bookmark(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> store::Result<()> {
        let affected = self.store.delete_by_keys(user_id, article_id).await?;
        if affected == 0 {
            return Err(StoreError::not_found::<Bookmark>(format!(
                "user {user_id}, article {article_id}"
            )));
        }
        Ok(())
    }
}
