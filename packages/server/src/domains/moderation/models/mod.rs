pub mod moderation_action;
pub mod outcome;
pub mod stats;

pub use moderation_action::{ModerationAction, ModerationActionKind, NewModerationAction, DEFAULT_ACTION_LIMIT};
pub use outcome::{Approval, Decline, Removal};
pub use stats::ModerationStats;
