// Infrastructure traits
//
// Every store and external service the moderation workflow talks to sits
// behind one of these traits so actions run unchanged against Postgres in
// production and in-memory doubles in tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{PublicationId, RecipeResult, SubmissionId, UserId};
use crate::domains::favorites::{Favorite, FavoriteRecipe};
use crate::domains::moderation::models::{Approval, Decline, ModerationAction, Removal};
use crate::domains::profiles::models::{PushToken, UserProfile};
use crate::domains::publications::PublicationRecord;
use crate::domains::recipes::RecipeContentPatch;
use crate::domains::submissions::{SubmissionCounts, SubmissionRecord};
use crate::kernel::notifications::NotificationKind;

// =============================================================================
// Recipe Store Trait (Infrastructure - submissions, publications, audit log)
// =============================================================================

/// Persistence for the three moderation collections and the favorites that
/// hang off publications.
///
/// Methods that take an acting user or admin run as one atomic unit: the
/// existence check, the ownership check, and every write either all happen
/// or none do. Existence is checked before ownership (`NotFound` wins over
/// `Unauthorized`).
#[async_trait]
pub trait BaseRecipeStore: Send + Sync {
    // --- Submission store ---------------------------------------------------

    /// Inserts a new draft.
    ///
    /// For a pending edit the referenced publication must exist (`NotFound`)
    /// and no other pending edit may exist for the same original/owner pair
    /// (`Conflict`).
    async fn insert_submission(&self, record: SubmissionRecord) -> RecipeResult<SubmissionRecord>;

    async fn get_submission(&self, id: SubmissionId) -> RecipeResult<Option<SubmissionRecord>>;

    /// Newest first, every status.
    async fn list_submissions_by_owner(&self, owner_id: &UserId)
        -> RecipeResult<Vec<SubmissionRecord>>;

    /// Oldest first, every status.
    async fn list_submission_queue(&self) -> RecipeResult<Vec<SubmissionRecord>>;

    async fn find_pending_edit(
        &self,
        original_recipe_id: PublicationId,
        owner_id: &UserId,
    ) -> RecipeResult<Option<SubmissionRecord>>;

    /// Merges an owner's patch. See `SubmissionRecord::apply_owner_edit`.
    async fn edit_submission(
        &self,
        id: SubmissionId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<SubmissionRecord>;

    /// Hard-deletes an owner's draft and returns it.
    async fn delete_submission(&self, id: SubmissionId, actor: &UserId)
        -> RecipeResult<SubmissionRecord>;

    async fn count_submissions(&self) -> RecipeResult<SubmissionCounts>;

    // --- Publication store --------------------------------------------------

    async fn get_publication(&self, id: PublicationId) -> RecipeResult<Option<PublicationRecord>>;

    async fn list_publications_by_owner(&self, owner_id: &UserId)
        -> RecipeResult<Vec<PublicationRecord>>;

    async fn list_publications_by_category(&self, category: &str)
        -> RecipeResult<Vec<PublicationRecord>>;

    /// Newest published first.
    async fn list_publications(&self) -> RecipeResult<Vec<PublicationRecord>>;

    async fn edit_publication(
        &self,
        id: PublicationId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<PublicationRecord>;

    async fn delete_publication(&self, id: PublicationId, actor: &UserId)
        -> RecipeResult<PublicationRecord>;

    async fn count_publications(&self) -> RecipeResult<i64>;

    // --- Favorites ----------------------------------------------------------

    /// Saves a publication for a user. The publication must exist
    /// (`NotFound`) and must not already be saved by that user (`Conflict`).
    /// Favorites go away with their publication.
    async fn add_favorite(&self, favorite: Favorite) -> RecipeResult<Favorite>;

    /// Returns whether a favorite was removed.
    async fn remove_favorite(&self, user_id: &UserId, recipe_id: PublicationId)
        -> RecipeResult<bool>;

    async fn is_favorite(&self, user_id: &UserId, recipe_id: PublicationId) -> RecipeResult<bool>;

    async fn count_favorites(&self, user_id: &UserId) -> RecipeResult<i64>;

    /// Most recently saved first.
    async fn list_favorites(&self, user_id: &UserId) -> RecipeResult<Vec<FavoriteRecipe>>;

    // --- Moderation units ---------------------------------------------------

    /// Claims the submission, creates or overwrites the publication, and
    /// appends the log entry. A submission that is already gone is `NotFound`.
    async fn approve_submission(
        &self,
        id: SubmissionId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Approval>;

    async fn decline_submission(
        &self,
        id: SubmissionId,
        admin_id: &UserId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> RecipeResult<Decline>;

    async fn remove_publication(
        &self,
        id: PublicationId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Removal>;

    /// Newest first.
    async fn list_actions(
        &self,
        since: Option<DateTime<Utc>>,
        limit: i64,
    ) -> RecipeResult<Vec<ModerationAction>>;

    async fn count_actions_since(&self, since: DateTime<Utc>) -> RecipeResult<i64>;
}

// =============================================================================
// Account Store Trait (Infrastructure - profiles and push tokens)
// =============================================================================

#[async_trait]
pub trait BaseAccountStore: Send + Sync {
    async fn upsert_profile(&self, user_id: &UserId, email: Option<&str>)
        -> RecipeResult<UserProfile>;

    async fn register_push_token(&self, token: PushToken) -> RecipeResult<PushToken>;

    /// Returns whether a token was removed.
    async fn remove_push_token(&self, user_id: &UserId) -> RecipeResult<bool>;
}

// =============================================================================
// Admin Directory Trait (Infrastructure - admin role resolution)
// =============================================================================

#[async_trait]
pub trait BaseAdminDirectory: Send + Sync {
    async fn is_admin(&self, user_id: &UserId) -> RecipeResult<bool>;
}

// =============================================================================
// Notification Sink Trait (Infrastructure - push delivery)
// =============================================================================

#[async_trait]
pub trait BaseNotificationSink: Send + Sync {
    async fn notify_user(
        &self,
        user_id: &UserId,
        title: &str,
        message: &str,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<()>;

    async fn notify_admins(&self, title: &str, message: &str, data: serde_json::Value)
        -> Result<()>;
}
