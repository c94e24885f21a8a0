use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::{ModerationActionId, RecipeResult, UserId};
use crate::domains::publications::PublicationRecord;
use crate::domains::submissions::SubmissionRecord;

/// Default page size for the audit log.
pub const DEFAULT_ACTION_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "moderation_action_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModerationActionKind {
    Approve,
    Decline,
    DeletePublished,
}

/// Append-only audit entry for an admin decision.
///
/// `recipe_id` is the submission id for approve/decline and the publication
/// id for delete_published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModerationAction {
    pub id: ModerationActionId,
    pub admin_id: UserId,
    pub action: ModerationActionKind,
    pub recipe_id: Uuid,
    pub recipe_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Creation parameters
// =============================================================================

#[derive(TypedBuilder)]
pub struct NewModerationAction {
    #[builder(setter(into))]
    pub admin_id: UserId,
    pub action: ModerationActionKind,
    pub recipe_id: Uuid,
    #[builder(setter(into))]
    pub recipe_name: String,
    #[builder(default, setter(strip_option, into))]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ModerationAction {
    pub fn new(params: NewModerationAction) -> Self {
        Self {
            id: ModerationActionId::new(),
            admin_id: params.admin_id,
            action: params.action,
            recipe_id: params.recipe_id,
            recipe_name: params.recipe_name,
            reason: params.reason,
            created_at: params.created_at,
        }
    }

    pub fn approval(admin_id: &UserId, submission: &SubmissionRecord, now: DateTime<Utc>) -> Self {
        Self::new(
            NewModerationAction::builder()
                .admin_id(admin_id.clone())
                .action(ModerationActionKind::Approve)
                .recipe_id(submission.id.into_uuid())
                .recipe_name(submission.content.title.clone())
                .created_at(now)
                .build(),
        )
    }

    pub fn decline(
        admin_id: &UserId,
        submission: &SubmissionRecord,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            NewModerationAction::builder()
                .admin_id(admin_id.clone())
                .action(ModerationActionKind::Decline)
                .recipe_id(submission.id.into_uuid())
                .recipe_name(submission.content.title.clone())
                .reason(reason)
                .created_at(now)
                .build(),
        )
    }

    pub fn removal(admin_id: &UserId, publication: &PublicationRecord, now: DateTime<Utc>) -> Self {
        Self::new(
            NewModerationAction::builder()
                .admin_id(admin_id.clone())
                .action(ModerationActionKind::DeletePublished)
                .recipe_id(publication.id.into_uuid())
                .recipe_name(publication.content.title.clone())
                .created_at(now)
                .build(),
        )
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> RecipeResult<Self> {
        let action = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO moderation_actions (id, admin_id, action, recipe_id, recipe_name, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.admin_id)
        .bind(self.action)
        .bind(self.recipe_id)
        .bind(&self.recipe_name)
        .bind(&self.reason)
        .bind(self.created_at)
        .fetch_one(executor)
        .await?;
        Ok(action)
    }

    /// Newest first, optionally only entries at or after `since`.
    pub async fn find_recent<'e>(
        since: Option<DateTime<Utc>>,
        limit: i64,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<Vec<Self>> {
        let actions = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM moderation_actions
            WHERE ($1::timestamptz IS NULL OR created_at >= $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(actions)
    }

    pub async fn count_since<'e>(
        since: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> RecipeResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM moderation_actions WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
