//! Comment aggregate and its service.

mod service;

pub use service::CommentService;

use chrono::{DateTime, Utc};
use common::{ArticleId, CommentId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use store::{PgQuery, PgRecord, Record};
use uuid::Uuid;

/// A user's comment on an article.
///
/// A user may leave any number of comments on the same article, so unlike
/// bookmarks there is no per-pair uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    user_id: UserId,
    article_id: ArticleId,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Creates a new, active comment with a fresh identity.
    pub fn new(user_id: UserId, article_id: ArticleId, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CommentId::new(),
            user_id,
            article_id,
            content: content.into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn article_id(&self) -> ArticleId {
        self.article_id
    }

    pub fn content(&self) -> &str {
        &self.content
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

    /// Returns a copy carrying new content, for use with `SoftDeleteStore::update`.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }
}

impl Record for Comment {
    type Id = CommentId;

    const ENTITY: &'static str = "comment";
    const UNIQUE_PER_KEYS: bool = false;

    fn id(&self) -> CommentId {
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

    fn apply_update(&mut self, changes: &Self, at: DateTime<Utc>) {
        self.content = changes.content.clone();
        self.updated_at = at;
    }
}

impl PgRecord for Comment {
    const TABLE: &'static str = "comments";
    const EXTRA_COLUMNS: &'static [&'static str] = &["content"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: CommentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            article_id: ArticleId::from_uuid(row.try_get::<Uuid, _>("article_id")?),
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn bind_extra<'q>(&self, query: PgQuery<'q>) -> PgQuery<'q> {
        query.bind(self.content.clone())
    }
}
