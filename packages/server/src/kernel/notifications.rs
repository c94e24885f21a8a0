//! Post-commit notification dispatch.
//!
//! Actions enqueue a [`Notification`] after their store unit commits. A
//! background worker drains the queue into a [`BaseNotificationSink`]. Delivery
//! failures are logged and dropped; they never reach the caller of the action.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use expo::{ExpoClient, PushMessage};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::common::{PublicationId, SubmissionId, UserId};
use crate::domains::profiles::models::PushToken;
use crate::kernel::BaseNotificationSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    RecipeApproved,
    RecipeDeclined,
    NewRecipeSubmitted,
}

/// A message waiting to be delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    User {
        user_id: UserId,
        title: String,
        message: String,
        kind: NotificationKind,
        data: serde_json::Value,
    },
    Admins {
        title: String,
        message: String,
        data: serde_json::Value,
    },
}

impl Notification {
    pub fn recipe_approved(owner_id: UserId, recipe_title: &str, recipe_id: PublicationId) -> Self {
        Self::User {
            user_id: owner_id,
            title: "Recipe Approved!".to_string(),
            message: format!(
                "Your recipe \"{}\" has been approved and is now published!",
                recipe_title
            ),
            kind: NotificationKind::RecipeApproved,
            data: json!({ "recipeId": recipe_id }),
        }
    }

    pub fn recipe_declined(
        owner_id: UserId,
        recipe_title: &str,
        reason: &str,
        submission_id: SubmissionId,
    ) -> Self {
        Self::User {
            user_id: owner_id,
            title: "Recipe Declined".to_string(),
            message: format!("Your recipe \"{}\" was declined: {}", recipe_title, reason),
            kind: NotificationKind::RecipeDeclined,
            data: json!({ "submissionId": submission_id, "reason": reason }),
        }
    }

    pub fn new_recipe_submitted(recipe_title: &str, submission_id: SubmissionId) -> Self {
        Self::Admins {
            title: "New Recipe Submitted".to_string(),
            message: format!(
                "A new recipe \"{}\" has been submitted for review.",
                recipe_title
            ),
            data: json!({
                "type": NotificationKind::NewRecipeSubmitted,
                "submissionId": submission_id,
            }),
        }
    }
}

// =============================================================================
// Queue + worker
// =============================================================================

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Never fails. A closed queue only drops the message with a warning.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(err) = self.tx.send(notification) {
            warn!(notification = ?err.0, "Notification queue closed, dropping message");
        }
    }
}

/// Drains the queue until every sender is dropped.
pub async fn run_notification_worker(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    sink: Arc<dyn BaseNotificationSink>,
) {
    while let Some(notification) = rx.recv().await {
        deliver(sink.as_ref(), notification).await;
    }
    debug!("Notification queue closed, worker exiting");
}

async fn deliver(sink: &dyn BaseNotificationSink, notification: Notification) {
    let result = match &notification {
        Notification::User {
            user_id,
            title,
            message,
            kind,
            data,
        } => {
            sink.notify_user(user_id, title, message, *kind, data.clone())
                .await
        }
        Notification::Admins {
            title,
            message,
            data,
        } => sink.notify_admins(title, message, data.clone()).await,
    };

    if let Err(err) = result {
        warn!(error = %err, ?notification, "Notification delivery failed");
    }
}

// =============================================================================
// Expo-backed sink
// =============================================================================

/// Delivers notifications as Expo pushes to tokens stored in `push_tokens`.
pub struct ExpoNotificationSink {
    client: ExpoClient,
    pool: PgPool,
    admin_emails: Vec<String>,
}

impl ExpoNotificationSink {
    pub fn new(client: ExpoClient, pool: PgPool, admin_emails: Vec<String>) -> Self {
        Self {
            client,
            pool,
            admin_emails: admin_emails
                .into_iter()
                .map(|email| email.to_lowercase())
                .collect(),
        }
    }
}

#[async_trait]
impl BaseNotificationSink for ExpoNotificationSink {
    async fn notify_user(
        &self,
        user_id: &UserId,
        title: &str,
        message: &str,
        kind: NotificationKind,
        data: serde_json::Value,
    ) -> Result<()> {
        let Some(token) = PushToken::find_by_user(user_id, &self.pool)
            .await
            .context("Failed to load push token")?
        else {
            debug!(user_id = %user_id, "No push token registered, skipping");
            return Ok(());
        };

        let mut data = data;
        if let Some(map) = data.as_object_mut() {
            map.insert("type".to_string(), json!(kind));
        }

        self.client
            .send(&PushMessage::new(token.token, title, message, data))
            .await
            .context("Expo push failed")?;
        Ok(())
    }

    async fn notify_admins(
        &self,
        title: &str,
        message: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        let tokens = PushToken::find_admin_tokens(&self.admin_emails, &self.pool)
            .await
            .context("Failed to load admin push tokens")?;

        if tokens.is_empty() {
            debug!("No admin push tokens registered, skipping");
            return Ok(());
        }

        let messages: Vec<PushMessage> = tokens
            .into_iter()
            .map(|t| PushMessage::new(t.token, title, message, data.clone()))
            .collect();

        let failed = self
            .client
            .send_batch(&messages)
            .await
            .context("Expo batch push failed")?;
        if failed > 0 {
            warn!(failed, total = messages.len(), "Some admin pushes were rejected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::RecordingNotificationSink;

    #[test]
    fn approval_message_text() {
        let n = Notification::recipe_approved(UserId::from("u1"), "Soup", PublicationId::new());
        match n {
            Notification::User {
                title,
                message,
                kind,
                ..
            } => {
                assert_eq!(title, "Recipe Approved!");
                assert_eq!(
                    message,
                    "Your recipe \"Soup\" has been approved and is now published!"
                );
                assert_eq!(kind, NotificationKind::RecipeApproved);
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[test]
    fn decline_message_includes_reason() {
        let n = Notification::recipe_declined(
            UserId::from("u1"),
            "Soup",
            "too short",
            SubmissionId::new(),
        );
        let Notification::User { message, .. } = n else {
            panic!("expected user notification");
        };
        assert_eq!(message, "Your recipe \"Soup\" was declined: too short");
    }

    #[tokio::test]
    async fn worker_delivers_in_order_and_exits_when_queue_closes() {
        let sink = Arc::new(RecordingNotificationSink::new());
        let (queue, rx) = NotificationQueue::new();

        queue.enqueue(Notification::new_recipe_submitted("Soup", SubmissionId::new()));
        queue.enqueue(Notification::recipe_approved(
            UserId::from("u1"),
            "Soup",
            PublicationId::new(),
        ));
        drop(queue);

        run_notification_worker(rx, sink.clone()).await;

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 2);
        assert!(matches!(delivered[0], Notification::Admins { .. }));
        assert!(matches!(delivered[1], Notification::User { .. }));
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stop_the_worker() {
        let sink = Arc::new(RecordingNotificationSink::new().failing());
        let (queue, rx) = NotificationQueue::new();

        queue.enqueue(Notification::new_recipe_submitted("One", SubmissionId::new()));
        queue.enqueue(Notification::new_recipe_submitted("Two", SubmissionId::new()));
        drop(queue);

        run_notification_worker(rx, sink.clone()).await;

        assert_eq!(sink.attempts(), 2);
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn enqueue_after_worker_gone_is_silent() {
        let (queue, rx) = NotificationQueue::new();
        drop(rx);
        queue.enqueue(Notification::new_recipe_submitted("Soup", SubmissionId::new()));
    }
}
