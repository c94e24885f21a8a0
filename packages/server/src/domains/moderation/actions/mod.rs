pub mod audit;
pub mod authorization;
pub mod review;

pub use audit::{list_actions, stats};
pub use authorization::require_admin;
pub use review::{approve, decline, delete_published, DEFAULT_DECLINE_REASON};
