use tracing::info;

use crate::common::{clock, RecipeError, RecipeResult, UserId};
use crate::domains::profiles::models::{PushPlatform, PushToken, UserProfile};
use crate::kernel::ServerDeps;

/// Records the caller's email so allow-listed admins resolve by user id.
pub async fn upsert_profile(
    user_id: &UserId,
    email: Option<&str>,
    deps: &ServerDeps,
) -> RecipeResult<UserProfile> {
    let email = email.map(str::trim).filter(|e| !e.is_empty());
    let profile = deps.accounts.upsert_profile(user_id, email).await?;
    info!(user_id = %user_id, role = ?profile.role, "Profile upserted");
    Ok(profile)
}

/// Stores (or replaces) the caller's device push token.
pub async fn register_push_token(
    user_id: &UserId,
    token: &str,
    platform: PushPlatform,
    deps: &ServerDeps,
) -> RecipeResult<PushToken> {
    let token = token.trim();
    if token.is_empty() {
        return Err(RecipeError::validation("push token is required"));
    }

    let registered = deps
        .accounts
        .register_push_token(PushToken {
            user_id: user_id.clone(),
            token: token.to_string(),
            platform,
            updated_at: clock::now(),
        })
        .await?;

    info!(user_id = %user_id, platform = ?platform, "Push token registered");
    Ok(registered)
}

/// Forgets the caller's push token (logout). Returns whether one existed.
pub async fn remove_push_token(user_id: &UserId, deps: &ServerDeps) -> RecipeResult<bool> {
    let removed = deps.accounts.remove_push_token(user_id).await?;
    info!(user_id = %user_id, removed, "Push token removed");
    Ok(removed)
}
