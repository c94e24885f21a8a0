//! Server dependencies for actions (using traits for testability)
//!
//! Every store and external service sits behind a trait object so the same
//! actions run against Postgres in production and in-memory doubles in tests.

use std::sync::Arc;

use crate::kernel::notifications::NotificationQueue;
use crate::kernel::stream_hub::ChangeHub;
use crate::kernel::{BaseAccountStore, BaseAdminDirectory, BaseRecipeStore};

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    /// Submissions, publications, and the moderation log
    pub store: Arc<dyn BaseRecipeStore>,
    /// Profiles and push tokens
    pub accounts: Arc<dyn BaseAccountStore>,
    /// Single source of truth for "is this user an admin"
    pub admins: Arc<dyn BaseAdminDirectory>,
    /// Post-commit notification outbox
    pub notifications: NotificationQueue,
    /// Change fan-out for real-time subscriptions
    pub change_hub: ChangeHub,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseRecipeStore>,
        accounts: Arc<dyn BaseAccountStore>,
        admins: Arc<dyn BaseAdminDirectory>,
        notifications: NotificationQueue,
        change_hub: ChangeHub,
    ) -> Self {
        Self {
            store,
            accounts,
            admins,
            notifications,
            change_hub,
        }
    }
}
