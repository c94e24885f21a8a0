use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use crate::common::{PublicationId, RecipeResult, UserId};
use crate::domains::publications::PublicationRecord;

/// A user's bookmark of a published recipe. At most one per (user, recipe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub user_id: UserId,
    pub recipe_id: PublicationId,
    pub added_at: DateTime<Utc>,
}

/// A favorite joined with the current state of its recipe.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecipe {
    pub added_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub recipe: PublicationRecord,
}

impl Favorite {
    pub fn new(user_id: UserId, recipe_id: PublicationId, added_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            recipe_id,
            added_at,
        }
    }

    /// Returns `None` when the user already has this recipe saved.
    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Option<Self>> {
        let favorite = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO recipe_favorites (user_id, recipe_id, added_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, recipe_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&self.user_id)
        .bind(self.recipe_id)
        .bind(self.added_at)
        .fetch_optional(executor)
        .await?;
        Ok(favorite)
    }

    pub async fn delete<'e>(
        user_id: &UserId,
        recipe_id: PublicationId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<bool> {
        let result =
            sqlx::query("DELETE FROM recipe_favorites WHERE user_id = $1 AND recipe_id = $2")
                .bind(user_id)
                .bind(recipe_id)
                .execute(executor)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists<'e>(
        user_id: &UserId,
        recipe_id: PublicationId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recipe_favorites WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn count_by_user<'e>(
        user_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipe_favorites WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(executor)
                .await?;
        Ok(count)
    }
}

impl FavoriteRecipe {
    /// The user's saved recipes, most recently saved first.
    pub async fn find_by_user<'e>(
        user_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let favorites = sqlx::query_as::<_, Self>(
            r#"
            SELECT r.*, f.added_at
            FROM recipe_favorites f
            JOIN recipes r ON r.id = f.recipe_id
            WHERE f.user_id = $1
            ORDER BY f.added_at DESC, r.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(favorites)
    }
}
