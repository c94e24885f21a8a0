//! Users' saved published recipes.

pub mod actions;
pub mod models;

pub use models::{Favorite, FavoriteRecipe};
