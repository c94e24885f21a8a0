use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::common::PublicationId;
use crate::domains::favorites::actions;
use crate::domains::favorites::{Favorite, FavoriteRecipe};
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub favorite: bool,
}

#[derive(Debug, Serialize)]
pub struct FavoriteCount {
    pub count: i64,
}

/// GET /api/favorites
pub async fn list_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<FavoriteRecipe>>> {
    let favorites = actions::list_favorites(&user.user_id, &state.deps).await?;
    Ok(Json(favorites))
}

/// GET /api/favorites/count
pub async fn count_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<Json<FavoriteCount>> {
    let count = actions::count_favorites(&user.user_id, &state.deps).await?;
    Ok(Json(FavoriteCount { count }))
}

/// GET /api/favorites/:recipe_id
pub async fn status_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<PublicationId>,
) -> ApiResult<Json<FavoriteStatus>> {
    let favorite = actions::is_favorite(&user.user_id, recipe_id, &state.deps).await?;
    Ok(Json(FavoriteStatus { favorite }))
}

/// POST /api/favorites/:recipe_id
pub async fn add_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<PublicationId>,
) -> ApiResult<(StatusCode, Json<Favorite>)> {
    let favorite = actions::add_favorite(&user.user_id, recipe_id, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// DELETE /api/favorites/:recipe_id
pub async fn remove_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<PublicationId>,
) -> ApiResult<StatusCode> {
    actions::remove_favorite(&user.user_id, recipe_id, &state.deps).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/favorites/:recipe_id/toggle
pub async fn toggle_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(recipe_id): Path<PublicationId>,
) -> ApiResult<Json<FavoriteStatus>> {
    let favorite = actions::toggle_favorite(&user.user_id, recipe_id, &state.deps).await?;
    Ok(Json(FavoriteStatus { favorite }))
}
