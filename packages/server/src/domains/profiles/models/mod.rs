pub mod push_token;
pub mod user_profile;

pub use push_token::{PushPlatform, PushToken};
pub use user_profile::{UserProfile, UserRole};
