use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};

use crate::common::SubmissionId;
use crate::domains::recipes::{RecipeContent, RecipeContentPatch};
use crate::domains::submissions::actions;
use crate::domains::submissions::SubmissionRecord;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

/// POST /api/submissions
pub async fn create_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(content): Json<RecipeContent>,
) -> ApiResult<(StatusCode, Json<SubmissionRecord>)> {
    let record = actions::create_submission(&user.user_id, content, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/submissions/mine
pub async fn list_mine_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<SubmissionRecord>>> {
    let records = actions::list_my_submissions(&user.user_id, &state.deps).await?;
    Ok(Json(records))
}

/// GET /api/submissions/:id (owner or admin)
pub async fn get_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<SubmissionId>,
) -> ApiResult<Json<SubmissionRecord>> {
    let record = actions::get_submission_for(id, &user.user_id, &state.deps).await?;
    Ok(Json(record))
}

/// PATCH /api/submissions/:id
pub async fn update_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<SubmissionId>,
    Json(patch): Json<RecipeContentPatch>,
) -> ApiResult<Json<SubmissionRecord>> {
    let record = actions::update_submission(id, &user.user_id, patch, &state.deps).await?;
    Ok(Json(record))
}

/// DELETE /api/submissions/:id
pub async fn delete_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<SubmissionId>,
) -> ApiResult<StatusCode> {
    actions::delete_submission(id, &user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}
