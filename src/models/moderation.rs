use serde::Deserialize;

use crate::{models::comment::ModerationEvent, Error, Result};

/// Admin decision on a comment awaiting review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditVerdict {
    Pass,
    Reject { ban_author: bool },
}

impl AuditVerdict {
    pub fn parse(result: &str, ban_user: bool) -> Result<Self> {
        match result.trim() {
            "pass" => Ok(AuditVerdict::Pass),
            "reject" => Ok(AuditVerdict::Reject {
                ban_author: ban_user,
            }),
            other => Err(Error::invalid(format!(
                "invalid audit result '{other}', expected pass or reject"
            ))),
        }
    }

    pub fn event(&self) -> ModerationEvent {
        match self {
            AuditVerdict::Pass => ModerationEvent::Pass,
            AuditVerdict::Reject { .. } => ModerationEvent::Reject,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuditCommentRequest {
    pub comment_id: Option<String>,
    pub result: Option<String>,
    #[serde(default)]
    pub ban_user: bool,
}
