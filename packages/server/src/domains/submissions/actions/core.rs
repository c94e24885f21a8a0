//! Owner-facing submission operations.

use tracing::{debug, info};

use crate::common::{clock, PublicationId, RecipeError, RecipeResult, SubmissionId, UserId};
use crate::domains::moderation::actions::require_admin;
use crate::domains::recipes::{RecipeContent, RecipeContentPatch};
use crate::domains::submissions::SubmissionRecord;
use crate::kernel::{Collection, Notification, ServerDeps};

/// Submit a brand-new recipe for review. Admins are notified.
pub async fn create_submission(
    owner_id: &UserId,
    content: RecipeContent,
    deps: &ServerDeps,
) -> RecipeResult<SubmissionRecord> {
    let content = content.normalized()?;
    let record = deps
        .store
        .insert_submission(SubmissionRecord::new_pending(
            owner_id.clone(),
            content,
            clock::now(),
        ))
        .await?;

    info!(
        submission_id = %record.id,
        owner_id = %owner_id,
        title = %record.content.title,
        "Recipe submitted for review"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(owner_id.clone()));
    deps.notifications.enqueue(Notification::new_recipe_submitted(
        &record.content.title,
        record.id,
    ));

    Ok(record)
}

/// `None` when absent. No authorization: callers decide who may see it.
pub async fn get_submission(
    id: SubmissionId,
    deps: &ServerDeps,
) -> RecipeResult<Option<SubmissionRecord>> {
    deps.store.get_submission(id).await
}

/// A submission as seen by `viewer`: only its owner or an admin may read it.
pub async fn get_submission_for(
    id: SubmissionId,
    viewer: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<SubmissionRecord> {
    let record = deps
        .store
        .get_submission(id)
        .await?
        .ok_or_else(|| RecipeError::not_found(format!("submission {}", id)))?;

    if &record.owner_id != viewer {
        require_admin(viewer, deps).await?;
    }
    Ok(record)
}

/// Every draft of an owner regardless of status, newest first.
pub async fn list_my_submissions(
    owner_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Vec<SubmissionRecord>> {
    let records = deps.store.list_submissions_by_owner(owner_id).await?;
    debug!(owner_id = %owner_id, count = records.len(), "Listed own submissions");
    Ok(records)
}

/// The admin review queue, oldest first.
pub async fn list_all_pending(
    actor: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Vec<SubmissionRecord>> {
    require_admin(actor, deps).await?;
    deps.store.list_submission_queue().await
}

/// Owner edit. A declined draft is put back into the queue.
pub async fn update_submission(
    id: SubmissionId,
    actor: &UserId,
    patch: RecipeContentPatch,
    deps: &ServerDeps,
) -> RecipeResult<SubmissionRecord> {
    let record = deps
        .store
        .edit_submission(id, actor, &patch, clock::now())
        .await?;

    info!(
        submission_id = %record.id,
        owner_id = %actor,
        status = %record.status,
        "Submission updated"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(record.owner_id.clone()));
    Ok(record)
}

/// Owner delete. Never affects publications.
pub async fn delete_submission(
    id: SubmissionId,
    actor: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<()> {
    let record = deps.store.delete_submission(id, actor).await?;

    info!(
        submission_id = %record.id,
        owner_id = %actor,
        status = %record.status,
        "Submission deleted by owner"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(record.owner_id));
    Ok(())
}

/// Request an edit of one of the caller's publications.
///
/// Fails with `Conflict` if an edit is already pending for this recipe; fetch
/// it with [`get_existing_pending_edit`] and update that one instead.
pub async fn create_pending_edit(
    original_recipe_id: PublicationId,
    owner_id: &UserId,
    content: RecipeContent,
    deps: &ServerDeps,
) -> RecipeResult<SubmissionRecord> {
    let original = deps
        .store
        .get_publication(original_recipe_id)
        .await?
        .ok_or_else(|| RecipeError::not_found(format!("recipe {}", original_recipe_id)))?;
    original.ensure_owned_by(owner_id)?;

    let content = content.normalized()?;
    let record = deps
        .store
        .insert_submission(SubmissionRecord::new_pending_edit(
            original_recipe_id,
            owner_id.clone(),
            content,
            clock::now(),
        ))
        .await
        .map_err(|err| match err {
            RecipeError::Conflict(_) => RecipeError::conflict(
                "a pending edit for this recipe already exists; edit the existing pending version instead",
            ),
            other => other,
        })?;

    info!(
        submission_id = %record.id,
        original_recipe_id = %original_recipe_id,
        owner_id = %owner_id,
        "Edit of published recipe submitted"
    );

    deps.change_hub
        .publish(Collection::Submissions, Some(owner_id.clone()));
    Ok(record)
}

pub async fn get_existing_pending_edit(
    original_recipe_id: PublicationId,
    owner_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Option<SubmissionRecord>> {
    deps.store
        .find_pending_edit(original_recipe_id, owner_id)
        .await
}
