//! Test fixtures for recipe content and users.

use recipes_core::common::UserId;
use recipes_core::domains::recipes::{Ingredient, RecipeContent};
use uuid::Uuid;

/// The recipe from the moderation walkthrough.
pub fn soup() -> RecipeContent {
    RecipeContent {
        title: "Soup".to_string(),
        description: "Warm and simple".to_string(),
        category: "Starter".to_string(),
        ingredients: vec![Ingredient::new("Salt", "1tsp")],
        instructions: vec!["Boil water".to_string()],
        ..Default::default()
    }
}

pub fn recipe(title: &str, category: &str) -> RecipeContent {
    RecipeContent {
        title: title.to_string(),
        description: format!("{} for tests", title),
        category: category.to_string(),
        ingredients: vec![Ingredient::new("Rice", "1 cup")],
        instructions: vec!["Cook".to_string(), "Serve".to_string()],
        ..Default::default()
    }
}

/// A user id no other test uses, for tests sharing one database.
pub fn unique_user(prefix: &str) -> UserId {
    UserId::new(format!("{}-{}", prefix, Uuid::new_v4()))
}
