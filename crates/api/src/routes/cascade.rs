//! Cascade-deletion participant endpoints.
//!
//! Called by the user and article deletion sagas of other services:
//! `POST /{bookmarks|comments}/cascade/{users|articles}/{id}/{delete|restore}`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ArticleId, UserId};
use saga::CascadeParticipant;
use serde::{Deserialize, Serialize};
use store::{Record, SoftDeleteStore};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Foreign key the cascade is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeScope {
    Users,
    Articles,
}

/// Forward operation or its compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeAction {
    Delete,
    Restore,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CascadeResponse {
    pub success: bool,
    pub affected: u64,
}

async fn run<R, S>(
    participant: &CascadeParticipant<R, S>,
    scope: CascadeScope,
    id: Uuid,
    action: CascadeAction,
) -> Result<Json<CascadeResponse>, ApiError>
where
    R: Record,
    S: SoftDeleteStore<R>,
{
    let affected = match (scope, action) {
        (CascadeScope::Users, CascadeAction::Delete) => {
            participant.delete_by_user_id(UserId::from_uuid(id)).await?
        }
        (CascadeScope::Users, CascadeAction::Restore) => {
            participant.restore_by_user_id(UserId::from_uuid(id)).await?
        }
        (CascadeScope::Articles, CascadeAction::Delete) => {
            participant.delete_by_article_id(ArticleId::from_uuid(id)).await?
        }
        (CascadeScope::Articles, CascadeAction::Restore) => {
            participant
                .restore_by_article_id(ArticleId::from_uuid(id))
                .await?
        }
    };

    Ok(Json(CascadeResponse {
        success: true,
        affected,
    }))
}

/// POST /bookmarks/cascade/{scope}/{id}/{action}
#[tracing::instrument(skip(state))]
pub async fn bookmarks(
    State(state): State<Arc<AppState>>,
    Path((scope, id, action)): Path<(CascadeScope, Uuid, CascadeAction)>,
) -> Result<Json<CascadeResponse>, ApiError> {
    run(&state.bookmark_cascade, scope, id, action).await
}

/// POST /comments/cascade/{scope}/{id}/{action}
#[tracing::instrument(skip(state))]
pub async fn comments(
    State(state): State<Arc<AppState>>,
    Path((scope, id, action)): Path<(CascadeScope, Uuid, CascadeAction)>,
) -> Result<Json<CascadeResponse>, ApiError> {
    run(&state.comment_cascade, scope, id, action).await
}
