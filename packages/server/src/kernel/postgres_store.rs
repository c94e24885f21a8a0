//! Postgres-backed stores.
//!
//! Each multi-write unit runs in one transaction. Preconditions ("the
//! submission still exists", "the caller owns the row") are checked inside
//! the transaction that performs the write, never in a separate earlier read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{PublicationId, RecipeError, RecipeResult, SubmissionId, UserId};
use crate::domains::favorites::{Favorite, FavoriteRecipe};
use crate::domains::moderation::models::{Approval, Decline, ModerationAction, Removal};
use crate::domains::profiles::models::{PushToken, UserProfile};
use crate::domains::publications::PublicationRecord;
use crate::domains::recipes::RecipeContentPatch;
use crate::domains::submissions::{SubmissionCounts, SubmissionRecord};
use crate::kernel::{BaseAccountStore, BaseRecipeStore};

pub struct PostgresRecipeStore {
    pool: PgPool,
}

impl PostgresRecipeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn submission_not_found(id: SubmissionId) -> RecipeError {
    RecipeError::not_found(format!("submission {}", id))
}

fn publication_not_found(id: PublicationId) -> RecipeError {
    RecipeError::not_found(format!("recipe {}", id))
}

#[async_trait]
impl BaseRecipeStore for PostgresRecipeStore {
    async fn insert_submission(&self, record: SubmissionRecord) -> RecipeResult<SubmissionRecord> {
        let mut tx = self.pool.begin().await?;

        if let Some(original_id) = record.original_recipe_id {
            PublicationRecord::find_by_id(original_id, &mut *tx)
                .await?
                .ok_or_else(|| publication_not_found(original_id))?;
        }

        // The partial unique index on pending edits turns a duplicate into Conflict.
        let inserted = record.insert(&mut *tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_submission(&self, id: SubmissionId) -> RecipeResult<Option<SubmissionRecord>> {
        SubmissionRecord::find_by_id(id, &self.pool).await
    }

    async fn list_submissions_by_owner(
        &self,
        owner_id: &UserId,
    ) -> RecipeResult<Vec<SubmissionRecord>> {
        SubmissionRecord::find_by_owner(owner_id, &self.pool).await
    }

    async fn list_submission_queue(&self) -> RecipeResult<Vec<SubmissionRecord>> {
        SubmissionRecord::find_queue(&self.pool).await
    }

    async fn find_pending_edit(
        &self,
        original_recipe_id: PublicationId,
        owner_id: &UserId,
    ) -> RecipeResult<Option<SubmissionRecord>> {
        SubmissionRecord::find_pending_edit(original_recipe_id, owner_id, &self.pool).await
    }

    async fn edit_submission(
        &self,
        id: SubmissionId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<SubmissionRecord> {
        let mut tx = self.pool.begin().await?;

        let mut record = SubmissionRecord::find_by_id_for_update(id, &mut *tx)
            .await?
            .ok_or_else(|| submission_not_found(id))?;
        record.ensure_owned_by(actor)?;
        record.apply_owner_edit(patch, now)?;

        let saved = record.save(&mut *tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_submission(
        &self,
        id: SubmissionId,
        actor: &UserId,
    ) -> RecipeResult<SubmissionRecord> {
        let mut tx = self.pool.begin().await?;

        let record = SubmissionRecord::find_by_id_for_update(id, &mut *tx)
            .await?
            .ok_or_else(|| submission_not_found(id))?;
        record.ensure_owned_by(actor)?;

        let deleted = SubmissionRecord::delete(id, &mut *tx)
            .await?
            .ok_or_else(|| submission_not_found(id))?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn count_submissions(&self) -> RecipeResult<SubmissionCounts> {
        SubmissionRecord::count_by_status(&self.pool).await
    }

    async fn get_publication(&self, id: PublicationId) -> RecipeResult<Option<PublicationRecord>> {
        PublicationRecord::find_by_id(id, &self.pool).await
    }

    async fn list_publications_by_owner(
        &self,
        owner_id: &UserId,
    ) -> RecipeResult<Vec<PublicationRecord>> {
        PublicationRecord::find_by_owner(owner_id, &self.pool).await
    }

    async fn list_publications_by_category(
        &self,
        category: &str,
    ) -> RecipeResult<Vec<PublicationRecord>> {
        PublicationRecord::find_by_category(category, &self.pool).await
    }

    async fn list_publications(&self) -> RecipeResult<Vec<PublicationRecord>> {
        PublicationRecord::find_all(&self.pool).await
    }

    async fn edit_publication(
        &self,
        id: PublicationId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<PublicationRecord> {
        let mut tx = self.pool.begin().await?;

        let mut record = PublicationRecord::find_by_id_for_update(id, &mut *tx)
            .await?
            .ok_or_else(|| publication_not_found(id))?;
        record.ensure_owned_by(actor)?;
        record.apply_owner_edit(patch, now)?;

        let saved = record.save_content(&mut *tx).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn delete_publication(
        &self,
        id: PublicationId,
        actor: &UserId,
    ) -> RecipeResult<PublicationRecord> {
        let mut tx = self.pool.begin().await?;

        let record = PublicationRecord::find_by_id_for_update(id, &mut *tx)
            .await?
            .ok_or_else(|| publication_not_found(id))?;
        record.ensure_owned_by(actor)?;

        let deleted = PublicationRecord::delete(id, &mut *tx)
            .await?
            .ok_or_else(|| publication_not_found(id))?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn count_publications(&self) -> RecipeResult<i64> {
        PublicationRecord::count(&self.pool).await
    }

    async fn add_favorite(&self, favorite: Favorite) -> RecipeResult<Favorite> {
        let mut tx = self.pool.begin().await?;

        PublicationRecord::find_by_id(favorite.recipe_id, &mut *tx)
            .await?
            .ok_or_else(|| publication_not_found(favorite.recipe_id))?;

        let saved = favorite
            .insert(&mut *tx)
            .await?
            .ok_or_else(|| RecipeError::conflict("recipe is already in favorites"))?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn remove_favorite(
        &self,
        user_id: &UserId,
        recipe_id: PublicationId,
    ) -> RecipeResult<bool> {
        Favorite::delete(user_id, recipe_id, &self.pool).await
    }

    async fn is_favorite(&self, user_id: &UserId, recipe_id: PublicationId) -> RecipeResult<bool> {
        Favorite::exists(user_id, recipe_id, &self.pool).await
    }

    async fn count_favorites(&self, user_id: &UserId) -> RecipeResult<i64> {
        Favorite::count_by_user(user_id, &self.pool).await
    }

    async fn list_favorites(&self, user_id: &UserId) -> RecipeResult<Vec<FavoriteRecipe>> {
        FavoriteRecipe::find_by_user(user_id, &self.pool).await
    }

    async fn approve_submission(
        &self,
        id: SubmissionId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Approval> {
        let mut tx = self.pool.begin().await?;

        // Claiming by DELETE makes a concurrent second approval see no row.
        let submission = SubmissionRecord::delete(id, &mut *tx)
            .await?
            .ok_or_else(|| submission_not_found(id))?;

        let publication = match submission.original_recipe_id {
            Some(original_id) => {
                let mut original = PublicationRecord::find_by_id_for_update(original_id, &mut *tx)
                    .await?
                    .ok_or_else(|| {
                        RecipeError::not_found(format!("original recipe {} missing", original_id))
                    })?;
                original.replace_content(submission.content.clone(), now);
                original.save_content(&mut *tx).await?
            }
            None => {
                PublicationRecord::from_submission(&submission, now)
                    .insert(&mut *tx)
                    .await?
            }
        };

        let action = ModerationAction::approval(admin_id, &submission, now)
            .insert(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Approval {
            submission,
            publication,
            action,
        })
    }

    async fn decline_submission(
        &self,
        id: SubmissionId,
        admin_id: &UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> RecipeResult<Decline> {
        let mut tx = self.pool.begin().await?;

        let mut submission = SubmissionRecord::find_by_id_for_update(id, &mut *tx)
            .await?
            .ok_or_else(|| submission_not_found(id))?;
        submission.mark_declined(reason.to_string(), now);
        let submission = submission.save(&mut *tx).await?;

        let action = ModerationAction::decline(admin_id, &submission, reason, now)
            .insert(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Decline { submission, action })
    }

    async fn remove_publication(
        &self,
        id: PublicationId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Removal> {
        let mut tx = self.pool.begin().await?;

        let publication = PublicationRecord::delete(id, &mut *tx)
            .await?
            .ok_or_else(|| publication_not_found(id))?;

        let action = ModerationAction::removal(admin_id, &publication, now)
            .insert(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Removal {
            publication,
            action,
        })
    }

    async fn list_actions(
        &self,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> RecipeResult<Vec<ModerationAction>> {
        ModerationAction::find_recent(since, limit, &self.pool).await
    }

    async fn count_actions_since(&self, since: DateTime<Utc>) -> RecipeResult<i64> {
        ModerationAction::count_since(since, &self.pool).await
    }
}

pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseAccountStore for PostgresAccountStore {
    async fn upsert_profile(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> RecipeResult<UserProfile> {
        UserProfile::upsert(user_id, email, &self.pool).await
    }

    async fn register_push_token(&self, token: PushToken) -> RecipeResult<PushToken> {
        token.upsert(&self.pool).await
    }

    async fn remove_push_token(&self, user_id: &UserId) -> RecipeResult<bool> {
        PushToken::delete_by_user(user_id, &self.pool).await
    }
}
