use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::{PublicationId, SubmissionId};
use crate::domains::moderation::actions;
use crate::domains::moderation::{ModerationAction, ModerationStats};
use crate::domains::publications::PublicationRecord;
use crate::domains::submissions::actions as submission_actions;
use crate::domains::submissions::SubmissionRecord;
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct DeclineRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ActionsQuery {
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// GET /api/admin/submissions
pub async fn queue_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<SubmissionRecord>>> {
    let records = submission_actions::list_all_pending(&user.user_id, &state.deps).await?;
    Ok(Json(records))
}

/// POST /api/admin/submissions/:id/approve
pub async fn approve_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<SubmissionId>,
) -> ApiResult<Json<PublicationRecord>> {
    let publication = actions::approve(id, &user.user_id, &state.deps).await?;
    Ok(Json(publication))
}

/// POST /api/admin/submissions/:id/decline
pub async fn decline_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<SubmissionId>,
    body: Option<Json<DeclineRequest>>,
) -> ApiResult<Json<SubmissionRecord>> {
    let reason = body.and_then(|Json(request)| request.reason);
    let record = actions::decline(id, &user.user_id, reason, &state.deps).await?;
    Ok(Json(record))
}

/// DELETE /api/admin/publications/:id
pub async fn delete_published_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<PublicationId>,
) -> ApiResult<StatusCode> {
    actions::delete_published(id, &user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/actions?since=&limit=
pub async fn actions_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<ActionsQuery>,
) -> ApiResult<Json<Vec<ModerationAction>>> {
    let entries =
        actions::list_actions(&user.user_id, query.since, query.limit, &state.deps).await?;
    Ok(Json(entries))
}

/// GET /api/admin/stats
pub async fn stats_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ModerationStats>> {
    let stats = actions::stats(&user.user_id, &state.deps).await?;
    Ok(Json(stats))
}
