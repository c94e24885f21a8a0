//! User profiles and device push tokens.

pub mod actions;
pub mod models;

pub use models::{PushPlatform, PushToken, UserProfile, UserRole};
