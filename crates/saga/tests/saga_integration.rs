//! Integration tests for the bookmark sagas and the cascade participants.

use std::time::Duration;

use async_trait::async_trait;
use common::{ArticleId, UserId};
use domain::{Bookmark, Comment};
use saga::{
    BookmarkCoordinator, CascadeParticipant, CounterError, CounterOperation, CounterService,
    InMemoryCounterService, SagaError,
};
use store::{InMemoryStore, SoftDeleteStore};
use uuid::Uuid;

type TestCoordinator = BookmarkCoordinator<InMemoryStore<Bookmark>, InMemoryCounterService>;

struct TestHarness {
    coordinator: TestCoordinator,
    bookmarks: InMemoryStore<Bookmark>,
    comments: InMemoryStore<Comment>,
    counter: InMemoryCounterService,
    bookmark_participant: CascadeParticipant<Bookmark, InMemoryStore<Bookmark>>,
    comment_participant: CascadeParticipant<Comment, InMemoryStore<Comment>>,
}

impl TestHarness {
    fn new() -> Self {
        let bookmarks = InMemoryStore::new();
        let comments = InMemoryStore::new();
        let counter = InMemoryCounterService::new();

        Self {
            coordinator: BookmarkCoordinator::new(bookmarks.clone(), counter.clone()),
            bookmark_participant: CascadeParticipant::new(bookmarks.clone()),
            comment_participant: CascadeParticipant::new(comments.clone()),
            bookmarks,
            comments,
            counter,
        }
    }

    async fn bookmark_articles(&self, user_id: UserId, n: usize) -> Vec<Bookmark> {
        let mut created = Vec::with_capacity(n);
        for _ in 0..n {
            created.push(
                self.coordinator
                    .create_bookmark(user_id, ArticleId::new())
                    .await
                    .unwrap(),
            );
        }
        created
    }
}

/// Commits increments on the inner counter but never answers the caller.
struct StalledCounter {
    inner: InMemoryCounterService,
}

#[async_trait]
impl CounterService for StalledCounter {
    async fn increment_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.inner.increment_count(article_id).await?;
        std::future::pending().await
    }

    async fn decrement_count(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.inner.decrement_count(article_id).await
    }

    async fn increment_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.inner.increment_count_compensate(article_id).await
    }

    async fn decrement_count_compensate(&self, article_id: ArticleId) -> Result<(), CounterError> {
        self.inner.decrement_count_compensate(article_id).await
    }
}

#[tokio::test]
async fn test_create_delete_recreate_scenario() {
    let h = TestHarness::new();
    let user_id = UserId::from_uuid(Uuid::from_u128(1));
    let article_id = ArticleId::from_uuid(Uuid::from_u128(1));

    let created = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();
    assert_eq!(created.user_id(), user_id);
    assert_eq!(created.article_id(), article_id);
    assert!(created.deleted_at().is_none());

    h.coordinator.delete_bookmark(user_id, article_id).await.unwrap();
    let deleted = h.bookmarks.get_unscoped(created.id()).await.unwrap();
    assert!(deleted.deleted_at().is_some());

    let recreated = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();
    assert_eq!(recreated.id(), created.id());
    assert!(recreated.deleted_at().is_none());

    assert_eq!(h.bookmarks.len().await, 1);
    assert_eq!(h.counter.count(article_id), 1);
    assert_eq!(
        h.counter.calls(),
        vec![
            (CounterOperation::Increment, article_id),
            (CounterOperation::Decrement, article_id),
            (CounterOperation::Increment, article_id),
        ]
    );
}

#[tokio::test]
async fn test_restore_failure_compensates_once() {
    let h = TestHarness::new();
    let user_id = UserId::new();
    let article_id = ArticleId::new();
    let created = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();
    h.coordinator.delete_bookmark(user_id, article_id).await.unwrap();

    h.bookmarks.set_fail_on_restore(true);
    let err = h
        .coordinator
        .create_bookmark(user_id, article_id)
        .await
        .unwrap_err();

    assert!(err.is_storage());
    assert_eq!(h.counter.call_count(CounterOperation::DecrementCompensate), 1);
    assert_eq!(h.counter.count(article_id), 0);
    let row = h.bookmarks.get_unscoped(created.id()).await.unwrap();
    assert!(row.deleted_at().is_some());
}

#[tokio::test]
async fn test_increment_failure_touches_nothing_else() {
    let h = TestHarness::new();
    let article_id = ArticleId::new();
    h.counter.remove_article(article_id);

    let err = h
        .coordinator
        .create_bookmark(UserId::new(), article_id)
        .await
        .unwrap_err();

    assert!(err.is_remote());
    assert_eq!(h.counter.calls(), vec![(CounterOperation::Increment, article_id)]);
    assert!(h.bookmarks.is_empty().await);
}

#[tokio::test]
async fn test_delete_failure_keeps_bookmark_active() {
    let h = TestHarness::new();
    let user_id = UserId::new();
    let article_id = ArticleId::new();
    let created = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();

    h.bookmarks.set_fail_on_delete(true);
    let err = h
        .coordinator
        .delete_bookmark(user_id, article_id)
        .await
        .unwrap_err();

    assert!(err.is_storage());
    assert_eq!(h.counter.call_count(CounterOperation::IncrementCompensate), 1);
    assert_eq!(h.counter.count(article_id), 1);
    let row = h.bookmarks.get_by_id(created.id()).await.unwrap();
    assert!(row.deleted_at().is_none());
}

#[tokio::test]
async fn test_failed_compensation_returns_original_error() {
    let h = TestHarness::new();
    let article_id = ArticleId::new();
    h.bookmarks.set_fail_on_create(true);
    h.counter
        .set_fail_on(CounterOperation::DecrementCompensate, true);

    let err = h
        .coordinator
        .create_bookmark(UserId::new(), article_id)
        .await
        .unwrap_err();

    // The counter stays incremented with no bookmark behind it.
    assert!(matches!(err, SagaError::Storage(_)));
    assert_eq!(h.counter.call_count(CounterOperation::DecrementCompensate), 1);
    assert_eq!(h.counter.count(article_id), 1);
    assert!(h.bookmarks.is_empty().await);
}

#[tokio::test]
async fn test_cascade_delete_then_restore_preserves_rows() {
    let h = TestHarness::new();
    let user_id = UserId::new();
    let before = h.bookmark_articles(user_id, 5).await;

    assert_eq!(h.bookmark_participant.delete_by_user_id(user_id).await.unwrap(), 5);
    assert_eq!(h.bookmark_participant.delete_by_user_id(user_id).await.unwrap(), 0);
    assert!(h.coordinator.bookmarks_for_user(user_id).await.unwrap().is_empty());

    assert_eq!(h.bookmark_participant.restore_by_user_id(user_id).await.unwrap(), 5);
    let after = h.coordinator.bookmarks_for_user(user_id).await.unwrap();

    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(after.iter()) {
        assert_eq!(new.id(), old.id());
        assert_eq!(new.article_id(), old.article_id());
        assert_eq!(new.created_at(), old.created_at());
        assert!(new.updated_at() >= old.updated_at());
        assert!(new.deleted_at().is_none());
    }
}

#[tokio::test]
async fn test_cascade_without_rows_succeeds() {
    let h = TestHarness::new();
    let user_id = UserId::new();
    let article_id = ArticleId::new();

    assert_eq!(h.bookmark_participant.delete_by_user_id(user_id).await.unwrap(), 0);
    assert_eq!(h.bookmark_participant.restore_by_user_id(user_id).await.unwrap(), 0);
    assert_eq!(h.comment_participant.delete_by_article_id(article_id).await.unwrap(), 0);
    assert_eq!(h.comment_participant.restore_by_article_id(article_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_article_cascade_spans_bookmarks_and_comments() {
    let h = TestHarness::new();
    let article_id = ArticleId::new();
    let other_article = ArticleId::new();
    for _ in 0..3 {
        h.coordinator
            .create_bookmark(UserId::new(), article_id)
            .await
            .unwrap();
    }
    h.coordinator
        .create_bookmark(UserId::new(), other_article)
        .await
        .unwrap();
    h.comments
        .create(Comment::new(UserId::new(), article_id, "nice"))
        .await
        .unwrap();
    h.comments
        .create(Comment::new(UserId::new(), other_article, "meh"))
        .await
        .unwrap();

    assert_eq!(h.bookmark_participant.delete_by_article_id(article_id).await.unwrap(), 3);
    assert_eq!(h.comment_participant.delete_by_article_id(article_id).await.unwrap(), 1);
    assert_eq!(h.bookmarks.active_count().await, 1);
    assert_eq!(h.comments.active_count().await, 1);

    // A later step of the article deletion failed; the orchestrator compensates.
    assert_eq!(h.comment_participant.restore_by_article_id(article_id).await.unwrap(), 1);
    assert_eq!(h.bookmark_participant.restore_by_article_id(article_id).await.unwrap(), 3);
    assert_eq!(h.bookmarks.active_count().await, 4);
    assert_eq!(h.comments.active_count().await, 2);
}

#[tokio::test]
async fn test_recreate_after_cascade_restores_same_row() {
    let h = TestHarness::new();
    let user_id = UserId::new();
    let article_id = ArticleId::new();
    let created = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();

    h.bookmark_participant.delete_by_user_id(user_id).await.unwrap();
    let recreated = h.coordinator.create_bookmark(user_id, article_id).await.unwrap();

    assert_eq!(recreated.id(), created.id());
    assert_eq!(h.bookmarks.len().await, 1);
}

#[tokio::test]
async fn test_timed_out_create_is_not_compensated() {
    let counter = InMemoryCounterService::new();
    let bookmarks = InMemoryStore::<Bookmark>::new();
    let coordinator = BookmarkCoordinator::new(
        bookmarks.clone(),
        StalledCounter {
            inner: counter.clone(),
        },
    );
    let article_id = ArticleId::new();

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        coordinator.create_bookmark(UserId::new(), article_id),
    )
    .await;

    // The increment committed remotely; the saga was aborted before it saw
    // the reply, so the counter keeps it and no bookmark exists.
    assert!(result.is_err());
    assert_eq!(counter.calls(), vec![(CounterOperation::Increment, article_id)]);
    assert_eq!(counter.call_count(CounterOperation::DecrementCompensate), 0);
    assert_eq!(counter.count(article_id), 1);
    assert!(bookmarks.is_empty().await);
}
