use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use surrealdb::sql::{Datetime, Thing};

use crate::{helpers::thing_helpers::record_key, models::target::TargetKind, Error, Result};

/// Visibility state of a comment. A rejected comment has no state: it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommentStatus {
    Normal,
    PendingReview,
    Reported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationEvent {
    Report,
    Pass,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationOutcome {
    Status(CommentStatus),
    Removed,
}

impl CommentStatus {
    pub const AWAITING_REVIEW: [CommentStatus; 2] =
        [CommentStatus::Reported, CommentStatus::PendingReview];

    pub fn is_awaiting_review(&self) -> bool {
        Self::AWAITING_REVIEW.contains(self)
    }

    /// Applies a moderation event. Reports are accepted from any state;
    /// audit decisions only on comments that are awaiting review.
    pub fn apply(self, event: ModerationEvent) -> Result<ModerationOutcome> {
        match event {
            ModerationEvent::Report => Ok(ModerationOutcome::Status(CommentStatus::Reported)),
            ModerationEvent::Pass | ModerationEvent::Reject if !self.is_awaiting_review() => Err(
                Error::invalid(format!("comment is not awaiting review (status: {})", self.as_ref())),
            ),
            ModerationEvent::Pass => Ok(ModerationOutcome::Status(CommentStatus::Normal)),
            ModerationEvent::Reject => Ok(ModerationOutcome::Removed),
        }
    }
}

/// Closed set of in-place comment mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentUpdate {
    IncrementLikes,
    SetStatus(CommentStatus),
}

impl CommentUpdate {
    /// SET clause for `UPDATE comment:x SET ...`. Values come from closed enums only.
    pub fn set_clause(&self) -> String {
        match self {
            CommentUpdate::IncrementLikes => "like_count += 1".to_string(),
            CommentUpdate::SetStatus(status) => format!("status = '{}'", status.as_ref()),
        }
    }
}

/// A comment row as stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    pub id: Thing,
    pub author: Thing,
    #[serde(default)]
    pub author_name: Option<String>,
    pub target_type: TargetKind,
    pub target: Thing,
    pub content: String,
    #[serde(default)]
    pub parent: Option<Thing>,
    pub status: CommentStatus,
    #[serde(default)]
    pub like_count: u64,
    pub created_at: Datetime,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentView {
    pub comment_id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub target_type: TargetKind,
    pub target_id: String,
    pub content: String,
    pub parent_id: Option<String>,
    pub status: CommentStatus,
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRecord> for CommentView {
    fn from(record: CommentRecord) -> Self {
        Self {
            comment_id: record_key(&record.id),
            author_id: record_key(&record.author),
            author_name: record.author_name,
            target_type: record.target_type,
            target_id: record_key(&record.target),
            content: record.content,
            parent_id: record.parent.as_ref().map(record_key),
            status: record.status,
            like_count: record.like_count,
            created_at: record.created_at.0,
        }
    }
}

/// `(id, parent)` pair used to walk reply trees.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentEdge {
    pub id: Thing,
    #[serde(default)]
    pub parent: Option<Thing>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    Time,
    Hot,
}

impl CommentSort {
    /// Anything other than `hot` sorts by time.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("hot") => CommentSort::Hot,
            _ => CommentSort::Time,
        }
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            CommentSort::Time => "created_at DESC",
            CommentSort::Hot => "like_count DESC, created_at DESC",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PublishCommentRequest {
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub content: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentIdRequest {
    pub comment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentActionRequest {
    pub comment_id: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyCommentsQuery {
    #[serde(default)]
    pub grouped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Like,
    Report,
}

impl CommentAction {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "like" => Ok(CommentAction::Like),
            "report" => Ok(CommentAction::Report),
            other => Err(Error::invalid(format!("unknown comment action: {other}"))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentList {
    pub comments: Vec<CommentView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CommentDetail {
    pub comment: CommentView,
    pub replies: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
pub struct CommentStats {
    pub target_type: TargetKind,
    pub target_id: String,
    pub total_count: u64,
    pub hottest_comment: Option<CommentView>,
}

#[derive(Debug, Default, Serialize)]
pub struct CommentGroup {
    pub count: usize,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MyComments {
    Flat {
        my_comments: Vec<CommentView>,
    },
    Grouped {
        songs: CommentGroup,
        albums: CommentGroup,
        songlists: CommentGroup,
    },
}

impl MyComments {
    /// Splits a newest-first list by target kind, keeping the order inside each group.
    pub fn grouped(comments: Vec<CommentView>) -> Self {
        let mut songs = CommentGroup::default();
        let mut albums = CommentGroup::default();
        let mut songlists = CommentGroup::default();

        for comment in comments {
            let group = match comment.target_type {
                TargetKind::Song => &mut songs,
                TargetKind::Album => &mut albums,
                TargetKind::Songlist => &mut songlists,
            };
            group.count += 1;
            group.comments.push(comment);
        }

        MyComments::Grouped {
            songs,
            albums,
            songlists,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublishedComment {
    pub message: String,
    pub comment_id: String,
}
