use crate::domains::moderation::models::ModerationAction;
use crate::domains::publications::PublicationRecord;
use crate::domains::submissions::SubmissionRecord;

/// Everything one committed approval wrote.
#[derive(Debug, Clone)]
pub struct Approval {
    /// The submission as it was when claimed (now deleted).
    pub submission: SubmissionRecord,
    /// The new or updated publication.
    pub publication: PublicationRecord,
    pub action: ModerationAction,
}

#[derive(Debug, Clone)]
pub struct Decline {
    pub submission: SubmissionRecord,
    pub action: ModerationAction,
}

#[derive(Debug, Clone)]
pub struct Removal {
    pub publication: PublicationRecord,
    pub action: ModerationAction,
}
