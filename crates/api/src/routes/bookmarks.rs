//! Bookmark saga endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ArticleId, BookmarkId, UserId};
use domain::Bookmark;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct BookmarkRequest {
    pub user_id: UserId,
    pub article_id: ArticleId,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub id: BookmarkId,
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bookmark> for BookmarkResponse {
    fn from(bookmark: Bookmark) -> Self {
        Self {
            id: bookmark.id(),
            user_id: bookmark.user_id(),
            article_id: bookmark.article_id(),
            created_at: bookmark.created_at(),
            updated_at: bookmark.updated_at(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// -- Handlers --

/// POST /bookmarks: bookmark an article, restoring an earlier bookmark if one exists.
#[tracing::instrument(skip(state))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkResponse>), ApiError> {
    let bookmark = state
        .bookmarks
        .create_bookmark(req.user_id, req.article_id)
        .await?;
    Ok((StatusCode::CREATED, Json(bookmark.into())))
}

/// DELETE /bookmarks: remove a bookmark.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookmarkRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .bookmarks
        .delete_bookmark(req.user_id, req.article_id)
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /users/{user_id}/bookmarks
#[tracing::instrument(skip(state))]
pub async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<BookmarkResponse>>, ApiError> {
    let bookmarks = state.bookmarks.bookmarks_for_user(user_id).await?;
    Ok(Json(bookmarks.into_iter().map(Into::into).collect()))
}
