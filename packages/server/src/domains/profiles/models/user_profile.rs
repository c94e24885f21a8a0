use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{RecipeResult, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Local mirror of an identity-provider user, used for admin resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Inserts or refreshes a profile. Never changes an existing role.
    pub async fn upsert<'e>(
        user_id: &UserId,
        email: Option<&str>,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Self> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_profiles (user_id, email, role)
            VALUES ($1, $2, 'user')
            ON CONFLICT (user_id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, user_profiles.email),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(email)
        .fetch_one(executor)
        .await?;
        Ok(profile)
    }

    pub async fn find_by_user<'e>(
        user_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let profile =
            sqlx::query_as::<_, Self>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(executor)
                .await?;
        Ok(profile)
    }

    /// Admin if the stored role says so or the stored email is allow-listed.
    ///
    /// `admin_emails` must already be lowercased.
    pub async fn is_admin<'e>(
        user_id: &UserId,
        admin_emails: &[String],
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<bool> {
        let is_admin = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM user_profiles
                WHERE user_id = $1
                  AND (role = 'admin' OR LOWER(email) = ANY($2))
            )
            "#,
        )
        .bind(user_id)
        .bind(admin_emails)
        .fetch_one(executor)
        .await?;
        Ok(is_admin)
    }
}
