use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{RecipeResult, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "push_platform", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PushPlatform {
    Ios,
    Android,
    Web,
}

/// A device's Expo push token. One per user, replaced on re-registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub user_id: UserId,
    pub token: String,
    pub platform: PushPlatform,
    pub updated_at: DateTime<Utc>,
}

impl PushToken {
    pub async fn upsert<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let token = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO push_tokens (user_id, token, platform, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                token = EXCLUDED.token,
                platform = EXCLUDED.platform,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(&self.user_id)
        .bind(&self.token)
        .bind(self.platform)
        .bind(self.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(token)
    }

    /// Returns whether a token was removed.
    pub async fn delete_by_user<'e>(
        user_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<bool> {
        let result = sqlx::query("DELETE FROM push_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_user<'e>(
        user_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let token = sqlx::query_as::<_, Self>("SELECT * FROM push_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(token)
    }

    /// Tokens of every user who currently resolves as admin.
    pub async fn find_admin_tokens<'e>(
        admin_emails: &[String],
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let tokens = sqlx::query_as::<_, Self>(
            r#"
            SELECT t.* FROM push_tokens t
            JOIN user_profiles p ON p.user_id = t.user_id
            WHERE p.role = 'admin' OR LOWER(p.email) = ANY($1)
            "#,
        )
        .bind(admin_emails)
        .fetch_all(executor)
        .await?;
        Ok(tokens)
    }
}
