use tracing::debug;

use crate::common::{RecipeError, RecipeResult, UserId};
use crate::kernel::ServerDeps;

/// Fails with `Unauthorized` unless the admin directory vouches for `user_id`.
///
/// Every admin-only action calls this before touching a store.
pub async fn require_admin(user_id: &UserId, deps: &ServerDeps) -> RecipeResult<()> {
    if deps.admins.is_admin(user_id).await? {
        return Ok(());
    }
    debug!(user_id = %user_id, "Rejected non-admin caller");
    Err(RecipeError::unauthorized("admin access required"))
}
