//! Typed identifiers for every persisted entity.

pub use super::id::Id;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker type for recipe submissions (drafts awaiting moderation).
pub struct Submission;

/// Marker type for published recipes.
pub struct Publication;

/// Marker type for moderation audit log entries.
pub struct ModerationEntry;

pub type SubmissionId = Id<Submission>;

pub type PublicationId = Id<Publication>;

pub type ModerationActionId = Id<ModerationEntry>;

/// Opaque user identifier issued by the identity provider.
///
/// Provider ids are arbitrary strings (not UUIDs), so this is a plain
/// newtype stored as `TEXT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
