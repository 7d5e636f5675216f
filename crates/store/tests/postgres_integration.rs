//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::Arc;

use domain::{Bookmark, Comment};
use serial_test::serial;
use sqlx::PgPool;
use store::{ArticleId, PostgresStore, SoftDeleteStore, StoreError, UserId};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_bookmarks_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/002_create_comments_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh pool with cleared tables
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bookmarks, comments")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

async fn bookmark_store() -> PostgresStore<Bookmark> {
    PostgresStore::new(get_test_pool().await)
}

async fn comment_store() -> PostgresStore<Comment> {
    PostgresStore::new(get_test_pool().await)
}

#[tokio::test]
#[serial]
async fn create_and_get_bookmark() {
    let store = bookmark_store().await;
    let bookmark = Bookmark::new(UserId::new(), ArticleId::new());

    let created = store.create(bookmark.clone()).await.unwrap();
    assert_eq!(created.id(), bookmark.id());

    let loaded = store.get_by_id(bookmark.id()).await.unwrap();
    assert_eq!(loaded.user_id(), bookmark.user_id());
    assert_eq!(loaded.article_id(), bookmark.article_id());
    assert!(loaded.deleted_at().is_none());
}

#[tokio::test]
#[serial]
async fn partial_unique_index_rejects_second_active_bookmark() {
    let store = bookmark_store().await;
    let (user_id, article_id) = (UserId::new(), ArticleId::new());

    store.create(Bookmark::new(user_id, article_id)).await.unwrap();
    let result = store.create(Bookmark::new(user_id, article_id)).await;

    assert!(matches!(result, Err(StoreError::Conflict { .. })));
}

#[tokio::test]
#[serial]
async fn soft_delete_then_restore_keeps_identity() {
    let store = bookmark_store().await;
    let (user_id, article_id) = (UserId::new(), ArticleId::new());
    let created = store.create(Bookmark::new(user_id, article_id)).await.unwrap();

    assert_eq!(store.delete_by_keys(user_id, article_id).await.unwrap(), 1);
    assert!(store.get_by_id(created.id()).await.unwrap_err().is_not_found());

    let unscoped = store
        .get_by_keys_unscoped(user_id, article_id)
        .await
        .unwrap()
        .expect("deleted row is visible unscoped");
    assert_eq!(unscoped.id(), created.id());
    assert!(unscoped.deleted_at().is_some());

    let returned = store.restore(created.id()).await.unwrap();
    assert_eq!(returned.id(), created.id());

    let restored = store.get_by_id(created.id()).await.unwrap();
    assert!(restored.deleted_at().is_none());
    assert_eq!(restored.created_at(), created.created_at());
    assert!(restored.updated_at() >= created.updated_at());
}

#[tokio::test]
#[serial]
async fn unscoped_lookup_returns_none_for_unknown_pair() {
    let store = bookmark_store().await;
    let found = store
        .get_by_keys_unscoped(UserId::new(), ArticleId::new())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
#[serial]
async fn restore_unknown_id_is_not_found() {
    let store = bookmark_store().await;
    let result = store.restore(Bookmark::new(UserId::new(), ArticleId::new()).id()).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn bulk_delete_and_restore_by_user() {
    let store = bookmark_store().await;
    let user_id = UserId::new();
    let mut originals = Vec::new();
    for _ in 0..3 {
        originals.push(store.create(Bookmark::new(user_id, ArticleId::new())).await.unwrap());
    }
    store.create(Bookmark::new(UserId::new(), ArticleId::new())).await.unwrap();

    assert_eq!(store.delete_by_user_id(user_id).await.unwrap(), 3);
    assert_eq!(store.delete_by_user_id(user_id).await.unwrap(), 0);
    assert!(store.find_by_user_id(user_id).await.unwrap().is_empty());

    assert_eq!(store.restore_by_user_id(user_id).await.unwrap(), 3);

    let restored = store.find_by_user_id(user_id).await.unwrap();
    assert_eq!(restored.len(), 3);
    for original in &originals {
        let row = restored.iter().find(|b| b.id() == original.id()).unwrap();
        assert_eq!(row.created_at(), original.created_at());
        assert!(row.deleted_at().is_none());
    }
}

#[tokio::test]
#[serial]
async fn bulk_restore_conflicts_with_active_duplicate() {
    let store = bookmark_store().await;
    let (user_id, article_id) = (UserId::new(), ArticleId::new());
    let old = store.create(Bookmark::new(user_id, article_id)).await.unwrap();
    store.delete_by_id(old.id()).await.unwrap();
    let other = store.create(Bookmark::new(user_id, ArticleId::new())).await.unwrap();
    store.delete_by_id(other.id()).await.unwrap();
    store.create(Bookmark::new(user_id, article_id)).await.unwrap();

    let result = store.restore_by_user_id(user_id).await;
    assert!(matches!(result, Err(StoreError::Conflict { .. })));

    // The statement is atomic, so the unrelated row stays deleted too.
    assert_eq!(store.find_by_user_id(user_id).await.unwrap().len(), 1);
    assert!(store.get_by_id(other.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn bulk_operations_on_empty_article_succeed() {
    let store = comment_store().await;
    let article_id = ArticleId::new();

    assert_eq!(store.delete_by_article_id(article_id).await.unwrap(), 0);
    assert_eq!(store.restore_by_article_id(article_id).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn comment_update_rewrites_content() {
    let store = comment_store().await;
    let comment = store
        .create(Comment::new(UserId::new(), ArticleId::new(), "before"))
        .await
        .unwrap();

    let updated = store.update(comment.with_content("after")).await.unwrap();
    assert_eq!(updated.content(), "after");
    assert_eq!(updated.id(), comment.id());

    store.delete_by_id(comment.id()).await.unwrap();
    let result = store.update(comment.with_content("too late")).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn comments_listed_by_article_in_creation_order() {
    let store = comment_store().await;
    let article_id = ArticleId::new();

    let first = store
        .create(Comment::new(UserId::new(), article_id, "first"))
        .await
        .unwrap();
    let second = store
        .create(Comment::new(UserId::new(), article_id, "second"))
        .await
        .unwrap();

    let listed = store.find_by_article_id(article_id).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec![first.id(), second.id()]);
}
