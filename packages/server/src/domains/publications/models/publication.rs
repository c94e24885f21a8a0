use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::common::{PublicationId, RecipeError, RecipeResult, UserId};
use crate::domains::recipes::{RecipeContent, RecipeContentPatch};
use crate::domains::submissions::SubmissionRecord;

/// A recipe visible to every user. Presence in the store means "approved".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRecord {
    pub id: PublicationId,
    pub owner_id: UserId,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub content: RecipeContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
}

impl PublicationRecord {
    /// Builds the publication for an approved brand-new submission.
    ///
    /// Keeps the submission's owner and creation time; gets a fresh id.
    pub fn from_submission(submission: &SubmissionRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: PublicationId::new(),
            owner_id: submission.owner_id.clone(),
            content: submission.content.clone(),
            created_at: submission.created_at,
            updated_at: now,
            published_at: now,
        }
    }

    /// Overwrites content in place. Identity and publish time are preserved.
    pub fn replace_content(&mut self, content: RecipeContent, now: DateTime<Utc>) {
        self.content = content;
        self.updated_at = now;
    }

    pub fn apply_owner_edit(
        &mut self,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<()> {
        let content = self.content.merged(patch)?;
        self.replace_content(content, now);
        Ok(())
    }

    pub fn ensure_owned_by(&self, user_id: &UserId) -> RecipeResult<()> {
        if &self.owner_id != user_id {
            return Err(RecipeError::unauthorized(format!(
                "recipe {} belongs to another user",
                self.id
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id<'e>(
        id: PublicationId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn find_by_id_for_update<'e>(
        id: PublicationId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>("SELECT * FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn find_by_owner<'e>(
        owner_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let records = sqlx::query_as::<_, Self>(
            "SELECT * FROM recipes WHERE owner_id = $1 ORDER BY published_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
        Ok(records)
    }

    pub async fn find_by_category<'e>(
        category: &str,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let records = sqlx::query_as::<_, Self>(
            "SELECT * FROM recipes WHERE category = $1 ORDER BY published_at DESC, id DESC",
        )
        .bind(category)
        .fetch_all(executor)
        .await?;
        Ok(records)
    }

    /// Every publication, newest published first.
    pub async fn find_all<'e>(executor: impl PgExecutor<'e>) -> RecipeResult<Vec<Self>> {
        let records =
            sqlx::query_as::<_, Self>("SELECT * FROM recipes ORDER BY published_at DESC, id DESC")
                .fetch_all(executor)
                .await?;
        Ok(records)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO recipes (
                id, owner_id,
                title, description, image, cook_time, servings, category, area,
                ingredients, instructions, video_url,
                created_at, updated_at, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.owner_id)
        .bind(&self.content.title)
        .bind(&self.content.description)
        .bind(&self.content.image)
        .bind(&self.content.cook_time)
        .bind(&self.content.servings)
        .bind(&self.content.category)
        .bind(&self.content.area)
        .bind(Json(&self.content.ingredients))
        .bind(&self.content.instructions)
        .bind(&self.content.video_url)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.published_at)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Writes the content columns and `updated_at`.
    pub async fn save_content<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recipes SET
                title = $2,
                description = $3,
                image = $4,
                cook_time = $5,
                servings = $6,
                category = $7,
                area = $8,
                ingredients = $9,
                instructions = $10,
                video_url = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.content.title)
        .bind(&self.content.description)
        .bind(&self.content.image)
        .bind(&self.content.cook_time)
        .bind(&self.content.servings)
        .bind(&self.content.category)
        .bind(&self.content.area)
        .bind(Json(&self.content.ingredients))
        .bind(&self.content.instructions)
        .bind(&self.content.video_url)
        .bind(self.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    pub async fn delete<'e>(
        id: PublicationId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>("DELETE FROM recipes WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn count<'e>(executor: impl PgExecutor<'e>) -> RecipeResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
