// TestDependencies - in-memory implementations for testing
//
// Provides stores, an admin directory, and a notification sink that can be
// injected into ServerDeps for unit tests, HTTP tests, and local runs
// without a database.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::notifications::{Notification, NotificationKind, NotificationQueue};
use super::stream_hub::ChangeHub;
use super::{
    BaseAccountStore, BaseAdminDirectory, BaseNotificationSink, BaseRecipeStore, ServerDeps,
};
use crate::common::{clock, PublicationId, RecipeError, RecipeResult, SubmissionId, UserId};
use crate::domains::favorites::{Favorite, FavoriteRecipe};
use crate::domains::moderation::models::{Approval, Decline, ModerationAction, Removal};
use crate::domains::profiles::models::{PushToken, UserProfile, UserRole};
use crate::domains::publications::PublicationRecord;
use crate::domains::recipes::RecipeContentPatch;
use crate::domains::submissions::{SubmissionCounts, SubmissionRecord, SubmissionStatus};

// =============================================================================
// In-memory recipe store
// =============================================================================

#[derive(Default)]
struct RecipeTables {
    submissions: HashMap<SubmissionId, SubmissionRecord>,
    publications: HashMap<PublicationId, PublicationRecord>,
    actions: Vec<ModerationAction>,
    favorites: HashMap<(UserId, PublicationId), Favorite>,
}

impl RecipeTables {
    fn pending_edit_exists(
        &self,
        original_recipe_id: PublicationId,
        owner_id: &UserId,
        except: Option<SubmissionId>,
    ) -> bool {
        self.submissions.values().any(|s| {
            s.status == SubmissionStatus::PendingEdit
                && s.original_recipe_id == Some(original_recipe_id)
                && &s.owner_id == owner_id
                && Some(s.id) != except
        })
    }

    /// Mirrors the `ON DELETE CASCADE`s onto a removed recipe: its pending
    /// edits and every user's favorite of it.
    fn cascade_from(&mut self, publication_id: PublicationId) {
        self.submissions
            .retain(|_, s| s.original_recipe_id != Some(publication_id));
        self.favorites
            .retain(|(_, recipe_id), _| *recipe_id != publication_id);
    }
}

/// Recipe store held in memory.
///
/// Every operation runs under one async mutex, so each unit is all-or-nothing
/// and concurrent units are serialized.
#[derive(Default)]
pub struct InMemoryRecipeStore {
    tables: tokio::sync::Mutex<RecipeTables>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every logged action, oldest first.
    pub async fn actions(&self) -> Vec<ModerationAction> {
        self.tables.lock().await.actions.clone()
    }
}

fn newest_first_submissions(records: &mut [SubmissionRecord]) {
    records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
}

fn newest_first_publications(records: &mut [PublicationRecord]) {
    records.sort_by(|a, b| (b.published_at, b.id).cmp(&(a.published_at, a.id)));
}

#[async_trait]
impl BaseRecipeStore for InMemoryRecipeStore {
    async fn insert_submission(&self, record: SubmissionRecord) -> RecipeResult<SubmissionRecord> {
        let mut tables = self.tables.lock().await;

        if let Some(original_id) = record.original_recipe_id {
            if !tables.publications.contains_key(&original_id) {
                return Err(RecipeError::not_found(format!("recipe {}", original_id)));
            }
            if record.status == SubmissionStatus::PendingEdit
                && tables.pending_edit_exists(original_id, &record.owner_id, None)
            {
                return Err(RecipeError::conflict(
                    "a pending edit for this recipe already exists",
                ));
            }
        }

        tables.submissions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_submission(&self, id: SubmissionId) -> RecipeResult<Option<SubmissionRecord>> {
        Ok(self.tables.lock().await.submissions.get(&id).cloned())
    }

    async fn list_submissions_by_owner(
        &self,
        owner_id: &UserId,
    ) -> RecipeResult<Vec<SubmissionRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables
            .submissions
            .values()
            .filter(|s| &s.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first_submissions(&mut records);
        Ok(records)
    }

    async fn list_submission_queue(&self) -> RecipeResult<Vec<SubmissionRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables.submissions.values().cloned().collect();
        records.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(records)
    }

    async fn find_pending_edit(
        &self,
        original_recipe_id: PublicationId,
        owner_id: &UserId,
    ) -> RecipeResult<Option<SubmissionRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .submissions
            .values()
            .find(|s| {
                s.status == SubmissionStatus::PendingEdit
                    && s.original_recipe_id == Some(original_recipe_id)
                    && &s.owner_id == owner_id
            })
            .cloned())
    }

    async fn edit_submission(
        &self,
        id: SubmissionId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<SubmissionRecord> {
        let mut tables = self.tables.lock().await;

        let mut record = tables
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))?;
        record.ensure_owned_by(actor)?;
        record.apply_owner_edit(patch, now)?;

        if let (SubmissionStatus::PendingEdit, Some(original_id)) =
            (record.status, record.original_recipe_id)
        {
            if tables.pending_edit_exists(original_id, &record.owner_id, Some(record.id)) {
                return Err(RecipeError::conflict(
                    "a pending edit for this recipe already exists",
                ));
            }
        }

        tables.submissions.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_submission(
        &self,
        id: SubmissionId,
        actor: &UserId,
    ) -> RecipeResult<SubmissionRecord> {
        let mut tables = self.tables.lock().await;

        let record = tables
            .submissions
            .get(&id)
            .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))?;
        record.ensure_owned_by(actor)?;

        tables
            .submissions
            .remove(&id)
            .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))
    }

    async fn count_submissions(&self) -> RecipeResult<SubmissionCounts> {
        let tables = self.tables.lock().await;
        let mut counts = SubmissionCounts::default();
        for record in tables.submissions.values() {
            counts.record(record.status, 1);
        }
        Ok(counts)
    }

    async fn get_publication(&self, id: PublicationId) -> RecipeResult<Option<PublicationRecord>> {
        Ok(self.tables.lock().await.publications.get(&id).cloned())
    }

    async fn list_publications_by_owner(
        &self,
        owner_id: &UserId,
    ) -> RecipeResult<Vec<PublicationRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables
            .publications
            .values()
            .filter(|p| &p.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first_publications(&mut records);
        Ok(records)
    }

    async fn list_publications_by_category(
        &self,
        category: &str,
    ) -> RecipeResult<Vec<PublicationRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables
            .publications
            .values()
            .filter(|p| p.content.category == category)
            .cloned()
            .collect();
        newest_first_publications(&mut records);
        Ok(records)
    }

    async fn list_publications(&self) -> RecipeResult<Vec<PublicationRecord>> {
        let tables = self.tables.lock().await;
        let mut records: Vec<_> = tables.publications.values().cloned().collect();
        newest_first_publications(&mut records);
        Ok(records)
    }

    async fn edit_publication(
        &self,
        id: PublicationId,
        actor: &UserId,
        patch: &RecipeContentPatch,
        now: DateTime<Utc>,
    ) -> RecipeResult<PublicationRecord> {
        let mut tables = self.tables.lock().await;

        let record = tables
            .publications
            .get_mut(&id)
            .ok_or_else(|| RecipeError::not_found(format!("recipe {}", id)))?;
        record.ensure_owned_by(actor)?;
        record.apply_owner_edit(patch, now)?;
        Ok(record.clone())
    }

    async fn delete_publication(
        &self,
        id: PublicationId,
        actor: &UserId,
    ) -> RecipeResult<PublicationRecord> {
        let mut tables = self.tables.lock().await;

        let record = tables
            .publications
            .get(&id)
            .ok_or_else(|| RecipeError::not_found(format!("recipe {}", id)))?;
        record.ensure_owned_by(actor)?;

        let removed = tables
            .publications
            .remove(&id)
            .ok_or_else(|| RecipeError::not_found(format!("recipe {}", id)))?;
        tables.cascade_from(id);
        Ok(removed)
    }

    async fn count_publications(&self) -> RecipeResult<i64> {
        Ok(self.tables.lock().await.publications.len() as i64)
    }

    async fn add_favorite(&self, favorite: Favorite) -> RecipeResult<Favorite> {
        let mut tables = self.tables.lock().await;

        if !tables.publications.contains_key(&favorite.recipe_id) {
            return Err(RecipeError::not_found(format!("recipe {}", favorite.recipe_id)));
        }

        let key = (favorite.user_id.clone(), favorite.recipe_id);
        if tables.favorites.contains_key(&key) {
            return Err(RecipeError::conflict("recipe is already in favorites"));
        }
        tables.favorites.insert(key, favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(
        &self,
        user_id: &UserId,
        recipe_id: PublicationId,
    ) -> RecipeResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .favorites
            .remove(&(user_id.clone(), recipe_id))
            .is_some())
    }

    async fn is_favorite(&self, user_id: &UserId, recipe_id: PublicationId) -> RecipeResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.favorites.contains_key(&(user_id.clone(), recipe_id)))
    }

    async fn count_favorites(&self, user_id: &UserId) -> RecipeResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .favorites
            .keys()
            .filter(|(owner, _)| owner == user_id)
            .count() as i64)
    }

    async fn list_favorites(&self, user_id: &UserId) -> RecipeResult<Vec<FavoriteRecipe>> {
        let tables = self.tables.lock().await;
        let mut favorites: Vec<_> = tables
            .favorites
            .values()
            .filter(|f| &f.user_id == user_id)
            .filter_map(|f| {
                tables.publications.get(&f.recipe_id).map(|recipe| FavoriteRecipe {
                    added_at: f.added_at,
                    recipe: recipe.clone(),
                })
            })
            .collect();
        favorites.sort_by(|a, b| (b.added_at, b.recipe.id).cmp(&(a.added_at, a.recipe.id)));
        Ok(favorites)
    }

    async fn approve_submission(
        &self,
        id: SubmissionId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Approval> {
        let mut tables = self.tables.lock().await;

        let submission = tables
            .submissions
            .get(&id)
            .cloned()
            .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))?;

        let publication = match submission.original_recipe_id {
            Some(original_id) => {
                let original = tables.publications.get_mut(&original_id).ok_or_else(|| {
                    RecipeError::not_found(format!("original recipe {} missing", original_id))
                })?;
                original.replace_content(submission.content.clone(), now);
                original.clone()
            }
            None => {
                let publication = PublicationRecord::from_submission(&submission, now);
                tables
                    .publications
                    .insert(publication.id, publication.clone());
                publication
            }
        };

        tables.submissions.remove(&id);
        let action = ModerationAction::approval(admin_id, &submission, now);
        tables.actions.push(action.clone());

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
        let mut tables = self.tables.lock().await;

        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))?;
        submission.mark_declined(reason.to_string(), now);
        let submission = submission.clone();

        let action = ModerationAction::decline(admin_id, &submission, reason, now);
        tables.actions.push(action.clone());

        Ok(Decline { submission, action })
    }

    async fn remove_publication(
        &self,
        id: PublicationId,
        admin_id: &UserId,
        now: DateTime<Utc>,
    ) -> RecipeResult<Removal> {
        let mut tables = self.tables.lock().await;

        let publication = tables
            .publications
            .remove(&id)
            .ok_or_else(|| RecipeError::not_found(format!("recipe {}", id)))?;
        tables.cascade_from(id);

        let action = ModerationAction::removal(admin_id, &publication, now);
        tables.actions.push(action.clone());

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
        let tables = self.tables.lock().await;
        let mut actions: Vec<_> = tables
            .actions
            .iter()
            .filter(|a| since.map_or(true, |since| a.created_at >= since))
            .cloned()
            .collect();
        actions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        actions.truncate(limit.max(0) as usize);
        Ok(actions)
    }

    async fn count_actions_since(&self, since: DateTime<Utc>) -> RecipeResult<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .actions
            .iter()
            .filter(|a| a.created_at >= since)
            .count() as i64)
    }
}

// =============================================================================
// In-memory account store
// =============================================================================

#[derive(Default)]
pub struct InMemoryAccountStore {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    tokens: Mutex<HashMap<UserId, PushToken>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_token(&self, user_id: &UserId) -> Option<PushToken> {
        self.tokens.lock().unwrap().get(user_id).cloned()
    }

    pub fn profile(&self, user_id: &UserId) -> Option<UserProfile> {
        self.profiles.lock().unwrap().get(user_id).cloned()
    }
}

#[async_trait]
impl BaseAccountStore for InMemoryAccountStore {
    async fn upsert_profile(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> RecipeResult<UserProfile> {
        let now = clock::now();
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .entry(user_id.clone())
            .and_modify(|p| {
                if let Some(email) = email {
                    p.email = Some(email.to_string());
                }
                p.updated_at = now;
            })
            .or_insert_with(|| UserProfile {
                user_id: user_id.clone(),
                email: email.map(str::to_string),
                role: UserRole::User,
                created_at: now,
                updated_at: now,
            });
        Ok(profile.clone())
    }

    async fn register_push_token(&self, token: PushToken) -> RecipeResult<PushToken> {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.user_id.clone(), token.clone());
        Ok(token)
    }

    async fn remove_push_token(&self, user_id: &UserId) -> RecipeResult<bool> {
        Ok(self.tokens.lock().unwrap().remove(user_id).is_some())
    }
}

// =============================================================================
// Static admin directory
// =============================================================================

/// Admin directory backed by a fixed set of user ids.
#[derive(Default)]
pub struct StaticAdminDirectory {
    admins: RwLock<HashSet<UserId>>,
}

impl StaticAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_admin(self, user_id: impl Into<UserId>) -> Self {
        self.add(user_id);
        self
    }

    pub fn add(&self, user_id: impl Into<UserId>) {
        self.admins.write().unwrap().insert(user_id.into());
    }
}

#[async_trait]
impl BaseAdminDirectory for StaticAdminDirectory {
    async fn is_admin(&self, user_id: &UserId) -> RecipeResult<bool> {
        Ok(self.admins.read().unwrap().contains(user_id))
    }
}

// =============================================================================
// Recording notification sink
// =============================================================================

pub struct RecordingNotificationSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            attempts: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Every delivery attempt fails.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Notifications that were delivered successfully.
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, notification: Notification) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("push service unavailable");
        }
        self.delivered.lock().unwrap().push(notification);
        Ok(())
    }
}

impl Default for RecordingNotificationSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotificationSink for RecordingNotificationSink {
    async fn notify_user(
        &self,
        user_id: &UserId,
        title: &str,
        message: &str,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<()> {
        self.record(Notification::User {
            user_id: user_id.clone(),
            title: title.to_string(),
            message: message.to_string(),
            kind,
            data,
        })
    }

    async fn notify_admins(
        &self,
        title: &str,
        message: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        self.record(Notification::Admins {
            title: title.to_string(),
            message: message.to_string(),
            data,
        })
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory wiring for `ServerDeps`.
///
/// Enqueued notifications stay in an outbox until `take_notifications` is
/// called, so tests can assert on exactly what a workflow emitted.
pub struct TestDependencies {
    pub store: Arc<InMemoryRecipeStore>,
    pub accounts: Arc<InMemoryAccountStore>,
    pub admins: Arc<StaticAdminDirectory>,
    pub change_hub: ChangeHub,
    queue: NotificationQueue,
    outbox: Mutex<mpsc::UnboundedReceiver<Notification>>,
}

impl TestDependencies {
    pub fn new() -> Self {
        let (queue, outbox) = NotificationQueue::new();
        Self {
            store: Arc::new(InMemoryRecipeStore::new()),
            accounts: Arc::new(InMemoryAccountStore::new()),
            admins: Arc::new(StaticAdminDirectory::new()),
            change_hub: ChangeHub::new(),
            queue,
            outbox: Mutex::new(outbox),
        }
    }

    pub fn with_admin(self, user_id: impl Into<UserId>) -> Self {
        self.admins.add(user_id);
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.accounts.clone(),
            self.admins.clone(),
            self.queue.clone(),
            self.change_hub.clone(),
        )
    }

    /// Drains everything enqueued so far.
    pub fn take_notifications(&self) -> Vec<Notification> {
        let mut outbox = self.outbox.lock().unwrap();
        let mut taken = Vec::new();
        while let Ok(notification) = outbox.try_recv() {
            taken.push(notification);
        }
        taken
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
