use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::common::{PublicationId, RecipeError, RecipeResult, SubmissionId, UserId};
use crate::domains::recipes::{RecipeContent, RecipeContentPatch};

/// Moderation state of an in-flight recipe draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    PendingEdit,
    Declined,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::PendingEdit => write!(f, "pending_edit"),
            SubmissionStatus::Declined => write!(f, "declined"),
        }
    }
}

/// A recipe draft awaiting moderation: either a brand-new recipe or an edit
/// of an existing publication (`original_recipe_id` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub owner_id: UserId,
    pub status: SubmissionStatus,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub content: RecipeContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_recipe_id: Option<PublicationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submission counts per status, for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub pending: i64,
    pub pending_edit: i64,
    pub declined: i64,
}

impl SubmissionCounts {
    pub fn record(&mut self, status: SubmissionStatus, count: i64) {
        match status {
            SubmissionStatus::Pending => self.pending += count,
            SubmissionStatus::PendingEdit => self.pending_edit += count,
            SubmissionStatus::Declined => self.declined += count,
        }
    }
}

impl SubmissionRecord {
    pub fn new_pending(owner_id: UserId, content: RecipeContent, now: DateTime<Utc>) -> Self {
        Self {
            id: SubmissionId::new(),
            owner_id,
            status: SubmissionStatus::Pending,
            content,
            original_recipe_id: None,
            decline_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_pending_edit(
        original_recipe_id: PublicationId,
        owner_id: UserId,
        content: RecipeContent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status: SubmissionStatus::PendingEdit,
            original_recipe_id: Some(original_recipe_id),
            ..Self::new_pending(owner_id, content, now)
        }
    }

    pub fn is_edit(&self) -> bool {
        self.original_recipe_id.is_some()
    }

    pub fn ensure_owned_by(&self, user_id: &UserId) -> RecipeResult<()> {
        if &self.owner_id != user_id {
            return Err(RecipeError::unauthorized(format!(
                "submission {} belongs to another user",
                self.id
            )));
        }
        Ok(())
    }

    /// Applies an owner's content edit.
    ///
    /// A declined draft goes back into the queue: `pending_edit` when it
    /// edits a publication, `pending` otherwise. The decline reason is cleared.
    pub fn apply_owner_edit(
        &mut self,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<()> {
        self.content = self.content.merged(patch)?;
        if self.status == SubmissionStatus::Declined {
            self.status = if self.is_edit() {
                SubmissionStatus::PendingEdit
            } else {
                SubmissionStatus::Pending
            };
            self.decline_reason = None;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_declined(&mut self, reason: String, now: DateTime<Utc>) {
        self.status = SubmissionStatus::Declined;
        self.decline_reason = Some(reason);
        self.updated_at = now;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn find_by_id<'e>(
        id: SubmissionId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>("SELECT * FROM recipe_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    /// Loads and row-locks a submission for the rest of the transaction.
    pub async fn find_by_id_for_update<'e>(
        id: SubmissionId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            "SELECT * FROM recipe_submissions WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    /// All of an owner's drafts regardless of status, newest first.
    pub async fn find_by_owner<'e>(
        owner_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let records = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM recipe_submissions
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(executor)
        .await?;
        Ok(records)
    }

    /// The admin review queue, oldest first.
    pub async fn find_queue<'e>(executor: impl PgExecutor<'e>) -> RecipeResult<Vec<Self>> {
        let records = sqlx::query_as::<_, Self>(
            "SELECT * FROM recipe_submissions ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(records)
    }

    pub async fn find_pending_edit<'e>(
        original_recipe_id: PublicationId,
        owner_id: &UserId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM recipe_submissions
            WHERE original_recipe_id = $1
              AND owner_id = $2
              AND status = 'pending_edit'
            "#,
        )
        .bind(original_recipe_id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO recipe_submissions (
                id, owner_id, status,
                title, description, image, cook_time, servings, category, area,
                ingredients, instructions, video_url,
                original_recipe_id, decline_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.owner_id)
        .bind(self.status)
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
        .bind(self.original_recipe_id)
        .bind(&self.decline_reason)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Persists content, status, and decline reason. Identity fields never change.
    pub async fn save<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            UPDATE recipe_submissions SET
                status = $2,
                title = $3,
                description = $4,
                image = $5,
                cook_time = $6,
                servings = $7,
                category = $8,
                area = $9,
                ingredients = $10,
                instructions = $11,
                video_url = $12,
                decline_reason = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.status)
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
        .bind(&self.decline_reason)
        .bind(self.updated_at)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Deletes and returns the row. `None` means another transaction got there first.
    pub async fn delete<'e>(
        id: SubmissionId,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            "DELETE FROM recipe_submissions WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(record)
    }

    pub async fn count_by_status<'e>(
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<SubmissionCounts> {
        let rows = sqlx::query_as::<_, (SubmissionStatus, i64)>(
            "SELECT status, COUNT(*) FROM recipe_submissions GROUP BY status",
        )
        .fetch_all(executor)
        .await?;

        let mut counts = SubmissionCounts::default();
        for (status, count) in rows {
            counts.record(status, count);
        }
        Ok(counts)
    }
}
