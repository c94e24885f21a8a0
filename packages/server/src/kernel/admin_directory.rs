use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::common::{RecipeResult, UserId};
use crate::domains::profiles::models::UserProfile;
use crate::kernel::BaseAdminDirectory;

/// Resolves admins from `user_profiles`: the stored role, or an email on the
/// configured allow-list.
pub struct PostgresAdminDirectory {
    pool: PgPool,
    admin_emails: Vec<String>,
}

impl PostgresAdminDirectory {
    pub fn new(pool: PgPool, admin_emails: Vec<String>) -> Self {
        Self {
            pool,
            admin_emails: admin_emails
                .into_iter()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl BaseAdminDirectory for PostgresAdminDirectory {
    async fn is_admin(&self, user_id: &UserId) -> RecipeResult<bool> {
        let is_admin = UserProfile::is_admin(user_id, &self.admin_emails, &self.pool).await?;
        debug!(user_id = %user_id, is_admin, "Resolved admin status");
        Ok(is_admin)
    }
}
