// HTTP routes
pub mod admin;
pub mod favorites;
pub mod health;
pub mod profile;
pub mod publications;
pub mod streams;
pub mod submissions;
