use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::require_admin;
use crate::common::{clock, RecipeResult, UserId};
use crate::domains::moderation::models::{ModerationAction, ModerationStats, DEFAULT_ACTION_LIMIT};
use crate::kernel::ServerDeps;

/// Upper bound on a single page of the audit log.
pub const MAX_ACTION_LIMIT: i64 = 500;

/// Audit log, newest first.
pub async fn list_actions(
    actor: &UserId,
    since: Option<DateTime<Utc>>,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> RecipeResult<Vec<ModerationAction>> {
    require_admin(actor, deps).await?;

    let limit = limit
        .unwrap_or(DEFAULT_ACTION_LIMIT)
        .clamp(1, MAX_ACTION_LIMIT);
    deps.store.list_actions(since, limit).await
}

/// Dashboard counters, recomputed from the stores on every call.
pub async fn stats(actor: &UserId, deps: &ServerDeps) -> RecipeResult<ModerationStats> {
    require_admin(actor, deps).await?;

    let submissions = deps.store.count_submissions().await?;
    let published = deps.store.count_publications().await?;
    let recent_actions = deps
        .store
        .count_actions_since(clock::now() - Duration::hours(24))
        .await?;

    let stats = ModerationStats {
        pending: submissions.pending,
        pending_edits: submissions.pending_edit,
        declined: submissions.declined,
        published,
        recent_actions,
    };
    debug!(?stats, "Computed moderation stats");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RecipeError;
    use crate::domains::moderation::actions::{approve, decline};
    use crate::domains::recipes::{Ingredient, RecipeContent};
    use crate::domains::submissions::actions::{create_pending_edit, create_submission};
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

    #[tokio::test]
    async fn stats_reflect_store_contents() {
        let test_deps = TestDependencies::new().with_admin("admin");
        let deps = test_deps.server_deps();
        let owner = UserId::from("owner");
        let admin = UserId::from("admin");

        let first = create_submission(&owner, dish("One"), &deps).await.unwrap();
        let second = create_submission(&owner, dish("Two"), &deps).await.unwrap();
        create_submission(&owner, dish("Three"), &deps).await.unwrap();

        let published = approve(first.id, &admin, &deps).await.unwrap();
        decline(second.id, &admin, None, &deps).await.unwrap();
        create_pending_edit(published.id, &owner, dish("One v2"), &deps)
            .await
            .unwrap();

        let stats = stats(&admin, &deps).await.unwrap();
        assert_eq!(
            stats,
            ModerationStats {
                pending: 1,
                pending_edits: 1,
                declined: 1,
                published: 1,
                recent_actions: 2,
            }
        );
    }

    #[tokio::test]
    async fn list_actions_is_newest_first_and_clamped() {
        let test_deps = TestDependencies::new().with_admin("admin");
        let deps = test_deps.server_deps();
        let owner = UserId::from("owner");
        let admin = UserId::from("admin");

        for title in ["A", "B", "C"] {
            let submission = create_submission(&owner, dish(title), &deps).await.unwrap();
            approve(submission.id, &admin, &deps).await.unwrap();
        }

        let all = list_actions(&admin, None, None, &deps).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let one = list_actions(&admin, None, Some(0), &deps).await.unwrap();
        assert_eq!(one.len(), 1);

        let future = clock::now() + Duration::hours(1);
        let none = list_actions(&admin, Some(future), None, &deps).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn audit_views_are_admin_only() {
        let deps = TestDependencies::new().server_deps();
        let user = UserId::from("someone");

        assert!(matches!(
            stats(&user, &deps).await,
            Err(RecipeError::Unauthorized(_))
        ));
        assert!(matches!(
            list_actions(&user, None, None, &deps).await,
            Err(RecipeError::Unauthorized(_))
        ));
    }
}
