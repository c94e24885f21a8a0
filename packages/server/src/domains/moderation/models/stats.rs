use serde::{Deserialize, Serialize};

/// Admin dashboard counters, recomputed from the stores on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationStats {
    pub pending: i64,
    pub pending_edits: i64,
    pub declined: i64,
    pub published: i64,
    /// Log entries from the last 24 hours.
    pub recent_actions: i64,
}
