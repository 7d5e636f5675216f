//! Bookmark aggregate.

use chrono::{DateTime, Utc};
use common::{ArticleId, BookmarkId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use store::{PgQuery, PgRecord, Record};
use uuid::Uuid;

/// A user's bookmark on an article.
///
/// At most one active bookmark exists per (user, article). Unbookmarking
/// soft-deletes the row, and bookmarking again restores the same row instead
/// of inserting a second one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    id: BookmarkId,
    user_id: UserId,
    article_id: ArticleId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Bookmark {
    /// Creates a new, active bookmark with a fresh identity.
    pub fn new(user_id: UserId, article_id: ArticleId) -> Self {
        let now = Utc::now();
        Self {
            id: BookmarkId::new(),
            user_id,
            article_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn id(&self) -> BookmarkId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Record for Bookmark {
    type Id = BookmarkId;

    const ENTITY: &'static str = "bookmark";
    const UNIQUE_PER_KEYS: bool = true;

    fn id(&self) -> BookmarkId {
        self.id
    }

    fn user_id(&self) -> UserId {
        self.user_id
    }

    fn article_id(&self) -> ArticleId {
        self.article_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn mark_restored(&mut self, at: DateTime<Utc>) {
        self.deleted_at = None;
        self.updated_at = at;
    }

    // A bookmark carries no mutable payload.
    fn apply_update(&mut self, _changes: &Self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl PgRecord for Bookmark {
    const TABLE: &'static str = "bookmarks";
    const EXTRA_COLUMNS: &'static [&'static str] = &[];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: BookmarkId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            article_id: ArticleId::from_uuid(row.try_get::<Uuid, _>("article_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn bind_extra<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
    }
}
