//! End-to-end moderation workflows over the in-memory stores.
//!
//! These exercise the same actions the HTTP layer calls, including the
//! notification worker and live queries, without a database.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use crate::common::{recipe, soup};
use recipes_core::common::{RecipeError, UserId};
use recipes_core::domains::moderation::{actions as moderation, ModerationActionKind};
use recipes_core::domains::publications::actions as publications;
use recipes_core::domains::recipes::RecipeContentPatch;
use recipes_core::domains::submissions::actions as submissions;
use recipes_core::domains::submissions::SubmissionStatus;
use recipes_core::kernel::test_dependencies::RecordingNotificationSink;
use recipes_core::kernel::{
    run_notification_worker, BaseRecipeStore, ChangeHub, Notification, NotificationQueue,
    ServerDeps, TestDependencies,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn setup() -> (TestDependencies, ServerDeps, UserId, UserId) {
    let test_deps = TestDependencies::new().with_admin("admin");
    let deps = test_deps.server_deps();
    (test_deps, deps, UserId::from("cook"), UserId::from("admin"))
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn submitted_recipe_is_queued_then_published_on_approval() {
    let (_test_deps, deps, owner, admin) = setup();

    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    let queue = submissions::list_all_pending(&admin, &deps).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].status, SubmissionStatus::Pending);

    let publication = moderation::approve(submission.id, &admin, &deps)
        .await
        .unwrap();

    assert!(submissions::get_submission(submission.id, &deps)
        .await
        .unwrap()
        .is_none());
    let starters = publications::list_by_category("Starter", &deps).await.unwrap();
    assert!(starters.iter().any(|p| p.content.title == "Soup"));
    // Content crosses over unchanged.
    assert_eq!(publication.content, soup());
    assert_ne!(publication.id.into_uuid(), submission.id.into_uuid());
}

#[tokio::test]
async fn declined_recipe_stays_with_owner_and_publications_are_untouched() {
    let (_test_deps, deps, owner, admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();

    moderation::decline(submission.id, &admin, Some("too short".to_string()), &deps)
        .await
        .unwrap();

    let record = submissions::get_submission(submission.id, &deps)
        .await
        .unwrap()
        .expect("declined submission is kept");
    assert_eq!(record.status, SubmissionStatus::Declined);
    assert_eq!(record.decline_reason.as_deref(), Some("too short"));
    assert!(publications::list_all(&deps).await.unwrap().is_empty());
}

#[tokio::test]
async fn editing_a_declined_recipe_resubmits_it() {
    let (_test_deps, deps, owner, admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    moderation::decline(submission.id, &admin, None, &deps)
        .await
        .unwrap();

    let patch = RecipeContentPatch {
        instructions: Some(vec!["Boil water".to_string(), "Add salt".to_string()]),
        ..Default::default()
    };
    let updated = submissions::update_submission(submission.id, &owner, patch, &deps)
        .await
        .unwrap();

    assert_eq!(updated.status, SubmissionStatus::Pending);
    assert!(updated.decline_reason.is_none());
    let queue = submissions::list_all_pending(&admin, &deps).await.unwrap();
    assert_eq!(queue.iter().map(|r| r.id).collect::<Vec<_>>(), vec![submission.id]);
    assert_eq!(queue[0].status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn strangers_cannot_edit_someone_elses_submission() {
    let (_test_deps, deps, owner, _admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();

    let patch = RecipeContentPatch {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let err = submissions::update_submission(submission.id, &UserId::from("stranger"), patch, &deps)
        .await
        .unwrap_err();

    assert!(matches!(err, RecipeError::Unauthorized(_)));
    let unchanged = submissions::get_submission(submission.id, &deps)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged, submission);
}

#[tokio::test]
async fn concurrent_approvals_publish_exactly_once() {
    let (test_deps, deps, owner, admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        moderation::approve(submission.id, &admin, &deps),
        moderation::approve(submission.id, &admin, &deps),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(RecipeError::NotFound(_)))));
    assert_eq!(publications::list_all(&deps).await.unwrap().len(), 1);

    let approvals = test_deps
        .store
        .actions()
        .await
        .into_iter()
        .filter(|a| a.action == ModerationActionKind::Approve)
        .count();
    assert_eq!(approvals, 1);
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn publication_ids_never_collide_with_submission_ids() {
    let (_test_deps, deps, owner, admin) = setup();

    for title in ["One", "Two", "Three"] {
        let submission = submissions::create_submission(&owner, recipe(title, "Main"), &deps)
            .await
            .unwrap();
        moderation::approve(submission.id, &admin, &deps)
            .await
            .unwrap();
    }
    submissions::create_submission(&owner, recipe("Four", "Main"), &deps)
        .await
        .unwrap();

    let remaining = submissions::list_my_submissions(&owner, &deps).await.unwrap();
    for publication in publications::list_all(&deps).await.unwrap() {
        assert!(remaining
            .iter()
            .all(|s| s.id.into_uuid() != publication.id.into_uuid()));
    }
}

#[tokio::test]
async fn approved_edit_rewrites_publication_in_place() {
    let (_test_deps, deps, owner, admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    let published_at = Utc::now() - ChronoDuration::hours(1);
    let original = deps
        .store
        .approve_submission(submission.id, &admin, published_at)
        .await
        .unwrap()
        .publication;

    let revised = recipe("Tomato Soup", "Starter");
    let edit = submissions::create_pending_edit(original.id, &owner, revised.clone(), &deps)
        .await
        .unwrap();
    let edited_at = published_at + ChronoDuration::minutes(30);
    let updated = deps
        .store
        .approve_submission(edit.id, &admin, edited_at)
        .await
        .unwrap()
        .publication;

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.published_at, published_at);
    assert!(updated.updated_at > original.updated_at);
    assert_eq!(updated.updated_at, edited_at);
    assert_eq!(updated.content, revised);
    assert_eq!(publications::list_by_owner(&owner, &deps).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_edit_requests_leave_one_pending_edit() {
    let (_test_deps, deps, owner, admin) = setup();
    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    let original = moderation::approve(submission.id, &admin, &deps)
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        submissions::create_pending_edit(original.id, &owner, recipe("A", "Starter"), &deps),
        submissions::create_pending_edit(original.id, &owner, recipe("B", "Starter"), &deps),
    );

    assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1);
    assert!([first, second]
        .iter()
        .any(|r| matches!(r, Err(RecipeError::Conflict(_)))));

    let pending_edits = submissions::list_my_submissions(&owner, &deps)
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.status == SubmissionStatus::PendingEdit)
        .count();
    assert_eq!(pending_edits, 1);
}

#[tokio::test]
async fn every_decision_is_logged_once() {
    let (test_deps, deps, owner, admin) = setup();
    let first = submissions::create_submission(&owner, recipe("A", "Main"), &deps)
        .await
        .unwrap();
    let second = submissions::create_submission(&owner, recipe("B", "Main"), &deps)
        .await
        .unwrap();

    let publication = moderation::approve(first.id, &admin, &deps).await.unwrap();
    moderation::decline(second.id, &admin, Some("x".into()), &deps)
        .await
        .unwrap();
    moderation::decline(second.id, &admin, Some("y".into()), &deps)
        .await
        .unwrap();
    moderation::delete_published(publication.id, &admin, &deps)
        .await
        .unwrap();

    let kinds: Vec<_> = test_deps
        .store
        .actions()
        .await
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ModerationActionKind::Approve,
            ModerationActionKind::Decline,
            ModerationActionKind::Decline,
            ModerationActionKind::DeletePublished,
        ]
    );
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn broken_push_channel_never_fails_a_decision() {
    let (queue, rx) = NotificationQueue::new();
    let sink = Arc::new(RecordingNotificationSink::new().failing());
    let worker = tokio::spawn(run_notification_worker(rx, sink.clone()));

    let test_deps = TestDependencies::new().with_admin("admin");
    let base = test_deps.server_deps();
    let deps = ServerDeps::new(
        base.store.clone(),
        base.accounts.clone(),
        base.admins.clone(),
        queue,
        ChangeHub::new(),
    );
    let owner = UserId::from("cook");
    let admin = UserId::from("admin");

    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    moderation::approve(submission.id, &admin, &deps)
        .await
        .unwrap();

    drop(deps);
    drop(base);
    drop(test_deps);
    worker.await.unwrap();

    assert_eq!(sink.attempts(), 2);
    assert!(sink.delivered().is_empty());
}

#[tokio::test]
async fn worker_delivers_in_order() {
    let (queue, rx) = NotificationQueue::new();
    let sink = Arc::new(RecordingNotificationSink::new());
    let worker = tokio::spawn(run_notification_worker(rx, sink.clone()));

    let test_deps = TestDependencies::new().with_admin("admin");
    let base = test_deps.server_deps();
    let deps = ServerDeps::new(
        base.store.clone(),
        base.accounts.clone(),
        base.admins.clone(),
        queue,
        ChangeHub::new(),
    );
    let owner = UserId::from("cook");

    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    moderation::decline(submission.id, &UserId::from("admin"), None, &deps)
        .await
        .unwrap();

    drop(deps);
    drop(base);
    drop(test_deps);
    worker.await.unwrap();

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 2);
    assert_eq!(
        delivered[0],
        Notification::new_recipe_submitted("Soup", submission.id)
    );
    assert_eq!(
        delivered[1],
        Notification::recipe_declined(owner, "Soup", "No reason provided", submission.id)
    );
}

// ============================================================================
// Live queries
// ============================================================================

#[tokio::test]
async fn admin_queue_snapshots_follow_decisions() {
    let (_test_deps, deps, owner, admin) = setup();
    let mut queue = submissions::watch_queue(&admin, &deps).await.unwrap();

    assert!(queue.next().await.unwrap().unwrap().is_empty());

    let submission = submissions::create_submission(&owner, soup(), &deps)
        .await
        .unwrap();
    let snapshot = queue.next().await.unwrap().unwrap();
    assert_eq!(snapshot.iter().map(|s| s.id).collect::<Vec<_>>(), vec![submission.id]);

    moderation::approve(submission.id, &admin, &deps)
        .await
        .unwrap();
    let snapshot = tokio::time::timeout(Duration::from_secs(1), queue.next())
        .await
        .expect("queue refreshes after approval")
        .unwrap()
        .unwrap();
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn queue_watch_is_admin_only() {
    let (_test_deps, deps, owner, _admin) = setup();

    let result = submissions::watch_queue(&owner, &deps).await;

    assert!(matches!(result, Err(RecipeError::Unauthorized(_))));
}
