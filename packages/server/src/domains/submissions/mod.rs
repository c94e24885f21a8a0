//! Submission store: recipe drafts waiting on moderation.

pub mod actions;
pub mod models;

pub use models::{SubmissionCounts, SubmissionRecord, SubmissionStatus};
