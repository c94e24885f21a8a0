pub mod content;

pub use content::{Ingredient, RecipeContent, RecipeContentPatch};
