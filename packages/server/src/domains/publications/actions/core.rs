//! Publication store operations.
//!
//! Reads are public. Mutations are restricted to the recipe's owner; admins
//! take recipes down through `moderation::actions::delete_published`.

use futures::FutureExt;
use tracing::info;

use crate::common::{clock, PublicationId, RecipeResult, UserId};
use crate::domains::publications::PublicationRecord;
use crate::domains::recipes::RecipeContentPatch;
use crate::kernel::{Collection, ServerDeps, Snapshots};

pub async fn get_publication(
    id: PublicationId,
    deps: &ServerDeps,
) -> RecipeResult<Option<PublicationRecord>> {
    deps.store.get_publication(id).await
}

pub async fn list_by_owner(
    owner_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Vec<PublicationRecord>> {
    deps.store.list_publications_by_owner(owner_id).await
}

pub async fn list_by_category(
    category: &str,
    deps: &ServerDeps,
) -> RecipeResult<Vec<PublicationRecord>> {
    deps.store.list_publications_by_category(category.trim()).await
}

/// Every publication, newest published first.
pub async fn list_all(deps: &ServerDeps) -> RecipeResult<Vec<PublicationRecord>> {
    deps.store.list_publications().await
}

pub async fn update_publication(
    id: PublicationId,
    actor: &UserId,
    patch: RecipeContentPatch,
    deps: &ServerDeps,
) -> RecipeResult<PublicationRecord> {
    let record = deps
        .store
        .edit_publication(id, actor, &patch, clock::now())
        .await?;

    info!(recipe_id = %record.id, owner_id = %actor, "Published recipe updated by owner");

    deps.change_hub
        .publish(Collection::Publications, Some(record.owner_id.clone()));
    deps.change_hub.publish(Collection::Favorites, None);
    Ok(record)
}

/// Owner delete. Pending edits and favorites of the recipe are removed with it.
pub async fn delete_publication(
    id: PublicationId,
    actor: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<()> {
    let record = deps.store.delete_publication(id, actor).await?;

    info!(recipe_id = %record.id, owner_id = %actor, "Published recipe deleted by owner");

    deps.change_hub
        .publish(Collection::Publications, Some(record.owner_id.clone()));
    deps.change_hub
        .publish(Collection::Submissions, Some(record.owner_id));
    deps.change_hub.publish(Collection::Favorites, None);
    Ok(())
}

/// Live view of the owner's published recipes.
pub fn watch_my_publications(
    owner_id: &UserId,
    deps: &ServerDeps,
) -> Snapshots<PublicationRecord> {
    let store = deps.store.clone();
    let owner = owner_id.clone();

    Snapshots::new(
        &deps.change_hub,
        Collection::Publications,
        Some(owner_id.clone()),
        move || {
            let store = store.clone();
            let owner = owner.clone();
            async move { store.list_publications_by_owner(&owner).await }.boxed()
        },
    )
}
