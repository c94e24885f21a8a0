use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{PublicationId, RecipeError};
use crate::domains::publications::actions;
use crate::domains::publications::PublicationRecord;
use crate::domains::recipes::{RecipeContent, RecipeContentPatch};
use crate::domains::submissions::actions as submission_actions;
use crate::domains::submissions::SubmissionRecord;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// GET /api/publications (public)
pub async fn list_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<PublicationRecord>>> {
    let records = match query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(category) => actions::list_by_category(category, &state.deps).await?,
        None => actions::list_all(&state.deps).await?,
    };
    Ok(Json(records))
}

/// GET /api/publications/:id (public)
pub async fn get_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<PublicationId>,
) -> ApiResult<Json<PublicationRecord>> {
    let record = actions::get_publication(id, &state.deps)
        .await?
        .ok_or_else(|| RecipeError::not_found(format!("recipe {}", id)))?;
    Ok(Json(record))
}

/// GET /api/publications/mine
pub async fn list_mine_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<PublicationRecord>>> {
    let records = actions::list_by_owner(&user.user_id, &state.deps).await?;
    Ok(Json(records))
}

/// PATCH /api/publications/:id
pub async fn update_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<PublicationId>,
    Json(patch): Json<RecipeContentPatch>,
) -> ApiResult<Json<PublicationRecord>> {
    let record = actions::update_publication(id, &user.user_id, patch, &state.deps).await?;
    Ok(Json(record))
}

/// DELETE /api/publications/:id
pub async fn delete_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<PublicationId>,
) -> ApiResult<StatusCode> {
    actions::delete_publication(id, &user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/publications/:id/edits
pub async fn create_edit_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<PublicationId>,
    Json(content): Json<RecipeContent>,
) -> ApiResult<(StatusCode, Json<SubmissionRecord>)> {
    let record =
        submission_actions::create_pending_edit(id, &user.user_id, content, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/publications/:id/edits/mine
pub async fn get_my_edit_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<PublicationId>,
) -> ApiResult<Json<SubmissionRecord>> {
    let record = submission_actions::get_existing_pending_edit(id, &user.user_id, &state.deps)
        .await?
        .ok_or_else(|| RecipeError::not_found(format!("pending edit of recipe {}", id)))?;
    Ok(Json(record))
}
