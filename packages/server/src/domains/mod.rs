// Business domains
pub mod auth;
pub mod favorites;
pub mod moderation;
pub mod profiles;
pub mod publications;
pub mod recipes;
pub mod submissions;
