//! Comment CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{ArticleId, CommentId, UserId};
use domain::Comment;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::bookmarks::SuccessResponse;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateCommentRequest {
    pub user_id: UserId,
    pub content: String,
}

#[derive(Deserialize)]
pub struct DeleteCommentRequest {
    pub user_id: UserId,
}

// -- Response types --

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id(),
            user_id: comment.user_id(),
            article_id: comment.article_id(),
            content: comment.content().to_string(),
            created_at: comment.created_at(),
            updated_at: comment.updated_at(),
        }
    }
}

fn require_content(content: String) -> Result<String, ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }
    Ok(content)
}

// -- Handlers --

/// POST /comments
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    let content = require_content(req.content)?;
    let comment = state
        .comments
        .create_comment(req.user_id, req.article_id, content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// GET /comments/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<CommentId>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state.comments.get_comment(comment_id).await?;
    Ok(Json(comment.into()))
}

/// GET /articles/{article_id}/comments
#[tracing::instrument(skip(state))]
pub async fn list_for_article(
    State(state): State<Arc<AppState>>,
    Path(article_id): Path<ArticleId>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let comments = state.comments.comments_for_article(article_id).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

/// PUT /comments/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<CommentId>,
    Json(req): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let content = require_content(req.content)?;
    let comment = state
        .comments
        .update_content(comment_id, req.user_id, content)
        .await?;
    Ok(Json(comment.into()))
}

/// DELETE /comments/{id}
#[tracing::instrument(skip(state, req))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<CommentId>,
    Json(req): Json<DeleteCommentRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.comments.delete_comment(comment_id, req.user_id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
