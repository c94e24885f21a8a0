//! Live views over the submission store.

use futures::FutureExt;

use crate::common::{RecipeResult, UserId};
use crate::domains::moderation::actions::require_admin;
use crate::domains::submissions::SubmissionRecord;
use crate::kernel::{Collection, ServerDeps, Snapshots};

/// Live "my recipes" view: the owner's drafts, re-sent in full on every change.
pub fn watch_my_submissions(owner_id: &UserId, deps: &ServerDeps) -> Snapshots<SubmissionRecord> {
    let store = deps.store.clone();
    let owner = owner_id.clone();

    Snapshots::new(
        &deps.change_hub,
        Collection::Submissions,
        Some(owner_id.clone()),
        move || {
            let store = store.clone();
            let owner = owner.clone();
            async move { store.list_submissions_by_owner(&owner).await }.boxed()
        },
    )
}

/// Live admin review queue.
pub async fn watch_queue(
    actor: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Snapshots<SubmissionRecord>> {
    require_admin(actor, deps).await?;

    let store = deps.store.clone();
    Ok(Snapshots::new(
        &deps.change_hub,
        Collection::Submissions,
        None,
        move || {
            let store = store.clone();
            async move { store.list_submission_queue().await }.boxed()
        },
    ))
}
