// Common types shared across the application

pub mod clock;
pub mod entity_ids;
pub mod error;
pub mod id;

pub use entity_ids::*;
pub use error::{RecipeError, RecipeResult};
pub use id::Id;
