//! Cascade-deletion participant.
//!
//! When a user or an article is deleted by another service, that service's
//! saga calls these operations to soft-delete the dependent rows here, and
//! calls the matching restore if one of its later steps fails. Ordering and
//! retries belong to that external orchestrator.

use std::marker::PhantomData;

use common::{ArticleId, UserId};
use store::{Record, SoftDeleteStore};

use crate::error::Result;

/// Forward and compensating cascade operations for one record type.
///
/// Every operation is a single bulk store call, idempotent, and reports how
/// many rows changed. `Ok` always means success; there is no separate flag.
pub struct CascadeParticipant<R, S>
where
    R: Record,
    S: SoftDeleteStore<R>,
{
    store: S,
    _record: PhantomData<fn() -> R>,
}

impl<R, S> CascadeParticipant<R, S>
where
    R: Record,
    S: SoftDeleteStore<R>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Soft-deletes every active row of a deleted user.
    #[tracing::instrument(skip(self), fields(entity = R::ENTITY))]
    pub async fn delete_by_user_id(&self, user_id: UserId) -> Result<u64> {
        let affected = self.store.delete_by_user_id(user_id).await?;
        record(R::ENTITY, "delete_by_user_id", affected);
        Ok(affected)
    }

    /// Compensates `delete_by_user_id`.
    #[tracing::instrument(skip(self), fields(entity = R::ENTITY))]
    pub async fn restore_by_user_id(&self, user_id: UserId) -> Result<u64> {
        let affected = self.store.restore_by_user_id(user_id).await?;
        record(R::ENTITY, "restore_by_user_id", affected);
        Ok(affected)
    }

    /// Soft-deletes every active row of a deleted article.
    #[tracing::instrument(skip(self), fields(entity = R::ENTITY))]
    pub async fn delete_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        let affected = self.store.delete_by_article_id(article_id).await?;
        record(R::ENTITY, "delete_by_article_id", affected);
        Ok(affected)
    }

    /// Compensates `delete_by_article_id`.
    #[tracing::instrument(skip(self), fields(entity = R::ENTITY))]
    pub async fn restore_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        let affected = self.store.restore_by_article_id(article_id).await?;
        record(R::ENTITY, "restore_by_article_id", affected);
        Ok(affected)
    }
}

fn record(entity: &'static str, operation: &'static str, affected: u64) {
    metrics::counter!(
        "cascade_operations_total",
        "entity" => entity,
        "operation" => operation
    )
    .increment(1);
    tracing::info!(entity, operation, affected, "cascade operation applied");
}
