use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{ArticleId, UserId};
use tokio::sync::RwLock;

use crate::{Record, Result, SoftDeleteStore, StoreError};

#[derive(Debug, Default)]
struct FailureSwitches {
    create: AtomicBool,
    restore: AtomicBool,
    delete: AtomicBool,
}

/// In-memory soft-delete store.
///
/// Rows are kept in insertion order, which doubles as creation order.
/// Cloning yields another handle to the same rows. Failure switches let tests
/// simulate a storage outage on a given kind of write.
pub struct InMemoryStore<R: Record> {
    rows: Arc<RwLock<Vec<R>>>,
    failures: Arc<FailureSwitches>,
}

impl<R: Record> Clone for InMemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            failures: Arc::clone(&self.failures),
        }
    }
}

impl<R: Record> Default for InMemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(FailureSwitches::default()),
        }
    }
}

impl<R: Record> InMemoryStore<R> {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create` fail with `Unavailable`.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.failures.create.store(fail, Ordering::SeqCst);
    }

    /// Makes `restore` and the bulk restores fail with `Unavailable`.
    pub fn set_fail_on_restore(&self, fail: bool) {
        self.failures.restore.store(fail, Ordering::SeqCst);
    }

    /// Makes every soft delete fail with `Unavailable`.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.failures.delete.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of rows, including soft-deleted ones.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Returns true if the store holds no rows at all.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Returns the number of active rows.
    pub async fn active_count(&self) -> usize {
        self.rows
            .read()
            .await
            .iter()
            .filter(|r| !r.is_deleted())
            .count()
    }

    /// Loads a row by id regardless of its deletion marker.
    pub async fn get_unscoped(&self, id: R::Id) -> Option<R> {
        self.rows.read().await.iter().find(|r| r.id() == id).cloned()
    }

    fn check(&self, switch: &AtomicBool, operation: &str) -> Result<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "{} {operation} rejected",
                R::ENTITY
            )));
        }
        Ok(())
    }

    async fn soft_delete_where(&self, matches: impl Fn(&R) -> bool + Send) -> Result<u64> {
        self.check(&self.failures.delete, "delete")?;

        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let mut affected = 0;
        for row in rows.iter_mut() {
            if !row.is_deleted() && matches(&*row) {
                row.mark_deleted(now);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn restore_where(&self, matches: impl Fn(&R) -> bool + Send) -> Result<u64> {
        self.check(&self.failures.restore, "restore")?;

        let mut rows = self.rows.write().await;

        // All or nothing: a restore that would leave two active rows for one
        // pair changes no row at all.
        if R::UNIQUE_PER_KEYS {
            let mut pairs = HashSet::new();
            for row in rows.iter().filter(|r| r.is_deleted() && matches(*r)) {
                let (user_id, article_id) = (row.user_id(), row.article_id());
                let taken = !pairs.insert((user_id, article_id))
                    || rows
                        .iter()
                        .any(|r| !r.is_deleted() && r.matches_keys(user_id, article_id));
                if taken {
                    return Err(StoreError::conflict::<R>(format!(
                        "active row exists for user {user_id} and article {article_id}"
                    )));
                }
            }
        }

        let now = Utc::now();
        let mut affected = 0;
        for row in rows.iter_mut() {
            if row.is_deleted() && matches(&*row) {
                row.mark_restored(now);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn active_where(&self, matches: impl Fn(&R) -> bool + Send) -> Vec<R> {
        self.rows
            .read()
            .await
            .iter()
            .filter(|r| !r.is_deleted() && matches(*r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl<R: Record> SoftDeleteStore<R> for InMemoryStore<R> {
    async fn create(&self, record: R) -> Result<R> {
        self.check(&self.failures.create, "create")?;

        let mut rows = self.rows.write().await;

        if rows.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::conflict::<R>(format!(
                "id {} already exists",
                record.id()
            )));
        }

        // Partial unique index simulation: only active rows count.
        if R::UNIQUE_PER_KEYS
            && rows.iter().any(|r| {
                !r.is_deleted() && r.matches_keys(record.user_id(), record.article_id())
            })
        {
            return Err(StoreError::conflict::<R>(format!(
                "active row exists for user {} and article {}",
                record.user_id(),
                record.article_id()
            )));
        }

        rows.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: R::Id) -> Result<R> {
        self.rows
            .read()
            .await
            .iter()
            .find(|r| r.id() == id && !r.is_deleted())
            .cloned()
            .ok_or_else(|| StoreError::not_found::<R>(id))
    }

    async fn get_by_keys_unscoped(
        &self,
        user_id: UserId,
        article_id: ArticleId,
    ) -> Result<Option<R>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|r| r.matches_keys(user_id, article_id))
            .cloned())
    }

    async fn find_by_user_id(&self, user_id: UserId) -> Result<Vec<R>> {
        Ok(self.active_where(|r| r.user_id() == user_id).await)
    }

    async fn find_by_article_id(&self, article_id: ArticleId) -> Result<Vec<R>> {
        Ok(self.active_where(|r| r.article_id() == article_id).await)
    }

    async fn update(&self, record: R) -> Result<R> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id() == record.id() && !r.is_deleted())
            .ok_or_else(|| StoreError::not_found::<R>(record.id()))?;

        row.apply_update(&record, Utc::now());
        Ok(row.clone())
    }

    async fn restore(&self, id: R::Id) -> Result<R> {
        self.check(&self.failures.restore, "restore")?;

        let mut rows = self.rows.write().await;

        if R::UNIQUE_PER_KEYS
            && let Some(target) = rows.iter().find(|r| r.id() == id && r.is_deleted())
            && rows.iter().any(|r| {
                r.id() != id && !r.is_deleted() && r.matches_keys(target.user_id(), target.article_id())
            })
        {
            return Err(StoreError::conflict::<R>(format!(
                "active row exists for user {} and article {}",
                target.user_id(),
                target.article_id()
            )));
        }

        let row = rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| StoreError::not_found::<R>(id))?;

        row.mark_restored(Utc::now());
        Ok(row.clone())
    }

    async fn delete_by_id(&self, id: R::Id) -> Result<()> {
        match self.soft_delete_where(|r| r.id() == id).await? {
            0 => Err(StoreError::not_found::<R>(id)),
            _ => Ok(()),
        }
    }

    async fn delete_by_keys(&self, user_id: UserId, article_id: ArticleId) -> Result<u64> {
        self.soft_delete_where(|r| r.matches_keys(user_id, article_id))
            .await
    }

    async fn delete_by_user_id(&self, user_id: UserId) -> Result<u64> {
        self.soft_delete_where(|r| r.user_id() == user_id).await
    }

    async fn delete_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        self.soft_delete_where(|r| r.article_id() == article_id)
            .await
    }

    async fn restore_by_user_id(&self, user_id: UserId) -> Result<u64> {
        self.restore_where(|r| r.user_id() == user_id).await
    }

    async fn restore_by_article_id(&self, article_id: ArticleId) -> Result<u64> {
        self.restore_where(|r| r.article_id() == article_id).await
    }
}
