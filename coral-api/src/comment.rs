use uuid::Uuid;

use crate::{StoryId, Time, UserId, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// Opaque pagination cursor, only the data layer knows how to interpret it
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Cursor(pub String);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    None,
    Approved,
    Premod,
    Rejected,
    SystemWithheld,
}

impl CommentStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, CommentStatus::None | CommentStatus::Approved)
    }
}

/// Last moderation or authoring action the viewer performed on a comment
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewerAction {
    Create,
    Edit,
    Approve,
    Reject,
    Feature,
    Unfeature,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub story_id: StoryId,
    pub parent_id: Option<CommentId>,
    pub author_id: Option<UserId>,
    pub body: String,
    pub created_at: Time,
    pub status: CommentStatus,
    pub last_viewer_action: Option<ViewerAction>,

    /// Only filled in when the selection asked for it
    #[serde(default)]
    pub reply_count: Option<u32>,

    /// Only filled in when the selection asked for it
    #[serde(default)]
    pub entered_live: Option<bool>,
}

impl Comment {
    pub fn is_hidden_after_viewer_action(&self) -> bool {
        self.last_viewer_action.is_some() && !self.status.is_published()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReplyEdge {
    pub cursor: Cursor,
    pub node: Comment,
}
