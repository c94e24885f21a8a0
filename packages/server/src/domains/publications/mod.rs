//! Publication store: recipes visible to every user.

pub mod actions;
pub mod models;

pub use models::PublicationRecord;
