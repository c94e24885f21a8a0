//! Moderation engine: the only writer of the audit log and the only path from
//! the submission store into the publication store.

pub mod actions;
pub mod models;

pub use models::{ModerationAction, ModerationActionKind, ModerationStats};
