use axum::{extract::Extension, http::StatusCode, Json};
use serde::Deserialize;

use crate::domains::profiles::actions;
use crate::domains::profiles::{PushPlatform, PushToken, UserProfile};
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct RegisterPushTokenRequest {
    pub token: String,
    pub platform: PushPlatform,
}

/// POST /api/profile - records the token's email against the user id
pub async fn upsert_profile_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UserProfile>> {
    let profile =
        actions::upsert_profile(&user.user_id, user.email.as_deref(), &state.deps).await?;
    Ok(Json(profile))
}

/// POST /api/push-tokens
pub async fn register_push_token_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<RegisterPushTokenRequest>,
) -> ApiResult<Json<PushToken>> {
    let token =
        actions::register_push_token(&user.user_id, &request.token, request.platform, &state.deps)
            .await?;
    Ok(Json(token))
}

/// DELETE /api/push-tokens
pub async fn remove_push_token_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<StatusCode> {
    actions::remove_push_token(&user.user_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}
