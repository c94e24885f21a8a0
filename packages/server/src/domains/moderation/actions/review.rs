//! Admin decisions on submissions and publications.
//!
//! Each decision is one atomic store unit. Change events and notifications go
//! out only after it commits.

use tracing::info;

use super::require_admin;
use crate::common::{clock, PublicationId, RecipeResult, SubmissionId, UserId};
use crate::domains::moderation::models::{Approval, Decline, Removal};
use crate::domains::publications::PublicationRecord;
use crate::domains::submissions::SubmissionRecord;
use crate::kernel::{Collection, Notification, ServerDeps};

/// Reason recorded when an admin declines without giving one.
pub const DEFAULT_DECLINE_REASON: &str = "No reason provided";

/// Approve a submission: publish it (or apply it over its original) and
/// remove it from the queue.
///
/// Returns the new or updated publication.
pub async fn approve(
    submission_id: SubmissionId,
    admin_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<PublicationRecord> {
    require_admin(admin_id, deps).await?;

    let Approval {
        submission,
        publication,
        action,
    } = deps
        .store
        .approve_submission(submission_id, admin_id, clock::now())
        .await?;

    info!(
        submission_id = %submission.id,
        recipe_id = %publication.id,
        admin_id = %admin_id,
        action_id = %action.id,
        edit = submission.is_edit(),
        "Submission approved"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(submission.owner_id.clone()));
    deps.change_hub
        .publish(Collection::Publications, Some(publication.owner_id.clone()));
    deps.change_hub.publish(Collection::ModerationActions, None);
    if submission.is_edit() {
        deps.change_hub.publish(Collection::Favorites, None);
    }

    deps.notifications.enqueue(Notification::recipe_approved(
        submission.owner_id,
        &publication.content.title,
        publication.id,
    ));

    Ok(publication)
}

/// Decline a submission. It stays with its owner, marked declined, until they
/// edit or delete it. Declining again overwrites the reason.
pub async fn decline(
    submission_id: SubmissionId,
    admin_id: &UserId,
    reason: Option<String>,
    deps: &ServerDeps,
) -> RecipeResult<SubmissionRecord> {
    require_admin(admin_id, deps).await?;

    let reason = reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_DECLINE_REASON.to_string());

    let Decline { submission, action } = deps
        .store
        .decline_submission(submission_id, admin_id, &reason, clock::now())
        .await?;

    info!(
        submission_id = %submission.id,
        admin_id = %admin_id,
        action_id = %action.id,
        reason = %reason,
        "Submission declined"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(submission.owner_id.clone()));
    deps.change_hub.publish(Collection::ModerationActions, None);

    deps.notifications.enqueue(Notification::recipe_declined(
        submission.owner_id.clone(),
        &submission.content.title,
        &reason,
        submission.id,
    ));

    Ok(submission)
}

/// Take down any publication. Its open edits and favorites go with it.
pub async fn delete_published(
    publication_id: PublicationId,
    admin_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<PublicationRecord> {
    require_admin(admin_id, deps).await?;

    let Removal {
        publication,
        action,
    } = deps
        .store
        .remove_publication(publication_id, admin_id, clock::now())
        .await?;

    info!(
        recipe_id = %publication.id,
        owner_id = %publication.owner_id,
        admin_id = %admin_id,
        action_id = %action.id,
        "Published recipe deleted by admin"
    );

    deps.change_hub
        .publish(Collection::Publications, Some(publication.owner_id.clone()));
    deps.change_hub.publish(Collection::Submissions, None);
    deps.change_hub.publish(Collection::ModerationActions, None);
    deps.change_hub.publish(Collection::Favorites, None);

    Ok(publication)
}
