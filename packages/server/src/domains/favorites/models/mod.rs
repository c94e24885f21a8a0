pub mod favorite;

pub use favorite::{Favorite, FavoriteRecipe};
