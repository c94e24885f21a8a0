//! Favorites: a user's private list of saved publications.
//!
//! Only published recipes can be saved. A favorite always shows the recipe's
//! current content and disappears when the recipe is taken down.

use futures::FutureExt;
use tracing::info;

use crate::common::{clock, PublicationId, RecipeResult, UserId};
use crate::domains::favorites::{Favorite, FavoriteRecipe};
use crate::kernel::{Collection, ServerDeps, Snapshots};

/// Saving a recipe twice is a `Conflict`.
pub async fn add_favorite(
    user_id: &UserId,
    recipe_id: PublicationId,
    deps: &ServerDeps,
) -> RecipeResult<Favorite> {
    let favorite = deps
        .store
        .add_favorite(Favorite::new(user_id.clone(), recipe_id, clock::now()))
        .await?;

    info!(user_id = %user_id, recipe_id = %recipe_id, "Recipe added to favorites");

    deps.change_hub
        .publish(Collection::Favorites, Some(user_id.clone()));
    Ok(favorite)
}

/// Returns whether the recipe was saved. Removing an unsaved recipe is a no-op.
pub async fn remove_favorite(
    user_id: &UserId,
    recipe_id: PublicationId,
    deps: &ServerDeps,
) -> RecipeResult<bool> {
    let removed = deps.store.remove_favorite(user_id, recipe_id).await?;

    if removed {
        info!(user_id = %user_id, recipe_id = %recipe_id, "Recipe removed from favorites");
        deps.change_hub
            .publish(Collection::Favorites, Some(user_id.clone()));
    }
    Ok(removed)
}

/// Flips the saved state. Returns `true` when the recipe is now a favorite.
pub async fn toggle_favorite(
    user_id: &UserId,
    recipe_id: PublicationId,
    deps: &ServerDeps,
) -> RecipeResult<bool> {
    if remove_favorite(user_id, recipe_id, deps).await? {
        return Ok(false);
    }
    add_favorite(user_id, recipe_id, deps).await?;
    Ok(true)
}

pub async fn is_favorite(
    user_id: &UserId,
    recipe_id: PublicationId,
    deps: &ServerDeps,
) -> RecipeResult<bool> {
    deps.store.is_favorite(user_id, recipe_id).await
}

pub async fn count_favorites(user_id: &UserId, deps: &ServerDeps) -> RecipeResult<i64> {
    deps.store.count_favorites(user_id).await
}

/// Most recently saved first.
pub async fn list_favorites(
    user_id: &UserId,
    deps: &ServerDeps,
) -> RecipeResult<Vec<FavoriteRecipe>> {
    deps.store.list_favorites(user_id).await
}

/// Live view of the user's favorites. Refreshes on their own changes and on
/// any change to published recipes.
pub fn watch_my_favorites(user_id: &UserId, deps: &ServerDeps) -> Snapshots<FavoriteRecipe> {
    let store = deps.store.clone();
    let user = user_id.clone();

    Snapshots::new(
        &deps.change_hub,
        Collection::Favorites,
        Some(user_id.clone()),
        move || {
            let store = store.clone();
            let user = user.clone();
            async move { store.list_favorites(&user).await }.boxed()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RecipeError;
    use crate::domains::moderation::actions::{approve, delete_published};
    use crate::domains::publications::actions::{delete_publication, update_publication};
    use crate::domains::publications::PublicationRecord;
    use crate::domains::recipes::{Ingredient, RecipeContent, RecipeContentPatch};
    use crate::domains::submissions::actions::create_submission;
    use crate::kernel::TestDependencies;

    fn dish(title: &str) -> RecipeContent {
        RecipeContent {
            title: title.to_string(),
            description: "Tasty".to_string(),
            category: "Main".to_string(),
            ingredients: vec![Ingredient::new("Rice", "1 cup")],
            instructions: vec!["Cook".to_string()],
            ..Default::default()
        }
    }

    async fn publish(owner: &str, title: &str, deps: &ServerDeps) -> PublicationRecord {
        let submission = create_submission(&UserId::from(owner), dish(title), deps)
            .await
            .unwrap();
        approve(submission.id, &UserId::from("admin"), deps)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn saving_twice_is_a_conflict() {
        let deps = TestDependencies::new().with_admin("admin").server_deps();
        let recipe = publish("chef", "Curry", &deps).await;
        let fan = UserId::from("fan");

        add_favorite(&fan, recipe.id, &deps).await.unwrap();
        let second = add_favorite(&fan, recipe.id, &deps).await;

        assert!(matches!(second, Err(RecipeError::Conflict(_))));
        assert_eq!(count_favorites(&fan, &deps).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_published_recipes_can_be_saved() {
        let deps = TestDependencies::new().server_deps();

        let result = add_favorite(&UserId::from("fan"), PublicationId::new(), &deps).await;

        assert!(matches!(result, Err(RecipeError::NotFound(_))));
    }

    #[tokio::test]
    async fn favorites_are_per_user_and_newest_first() {
        let deps = TestDependencies::new().with_admin("admin").server_deps();
        let curry = publish("chef", "Curry", &deps).await;
        let stew = publish("chef", "Stew", &deps).await;
        let fan = UserId::from("fan");

        add_favorite(&fan, curry.id, &deps).await.unwrap();
        add_favorite(&fan, stew.id, &deps).await.unwrap();
        add_favorite(&UserId::from("other"), curry.id, &deps)
            .await
            .unwrap();

        let titles: Vec<_> = list_favorites(&fan, &deps)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.recipe.content.title)
            .collect();
        assert_eq!(titles, vec!["Stew", "Curry"]);
        assert!(is_favorite(&fan, stew.id, &deps).await.unwrap());
        assert!(!is_favorite(&UserId::from("other"), stew.id, &deps)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn toggle_flips_saved_state() {
        let deps = TestDependencies::new().with_admin("admin").server_deps();
        let recipe = publish("chef", "Curry", &deps).await;
        let fan = UserId::from("fan");

        assert!(toggle_favorite(&fan, recipe.id, &deps).await.unwrap());
        assert!(is_favorite(&fan, recipe.id, &deps).await.unwrap());
        assert!(!toggle_favorite(&fan, recipe.id, &deps).await.unwrap());
        assert!(!is_favorite(&fan, recipe.id, &deps).await.unwrap());
        assert!(!remove_favorite(&fan, recipe.id, &deps).await.unwrap());
    }

    #[tokio::test]
    async fn favorites_follow_the_recipe() {
        let deps = TestDependencies::new().with_admin("admin").server_deps();
        let chef = UserId::from("chef");
        let kept = publish("chef", "Curry", &deps).await;
        let owner_deleted = publish("chef", "Stew", &deps).await;
        let taken_down = publish("chef", "Pie", &deps).await;
        let fan = UserId::from("fan");

        for recipe in [&kept, &owner_deleted, &taken_down] {
            add_favorite(&fan, recipe.id, &deps).await.unwrap();
        }

        let patch = RecipeContentPatch {
            title: Some("Green Curry".to_string()),
            ..Default::default()
        };
        update_publication(kept.id, &chef, patch, &deps).await.unwrap();
        delete_publication(owner_deleted.id, &chef, &deps)
            .await
            .unwrap();
        delete_published(taken_down.id, &UserId::from("admin"), &deps)
            .await
            .unwrap();

        let favorites = list_favorites(&fan, &deps).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].recipe.content.title, "Green Curry");
        assert_eq!(count_favorites(&fan, &deps).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn watch_sees_saved_recipes() {
        let deps = TestDependencies::new().with_admin("admin").server_deps();
        let recipe = publish("chef", "Curry", &deps).await;
        let fan = UserId::from("fan");

        let mut snapshots = watch_my_favorites(&fan, &deps);
        assert!(snapshots.next().await.unwrap().unwrap().is_empty());

        add_favorite(&fan, recipe.id, &deps).await.unwrap();

        let snapshot = snapshots.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].recipe.id, recipe.id);
    }
}
