use crate::{CommentId, ReplyEdge};

/// Variables of the reply-created subscription
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReplyCreatedVariables {
    /// Top-level comment whose whole reply tree is watched
    pub ancestor_id: CommentId,

    /// if true, new direct replies are inserted into the list instead of
    /// waiting behind the "view new" control
    pub live_direct_replies_insertion: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    ReplyCreated {
        ancestor_id: CommentId,
        /// `edge.node.parent_id` is the comment the reply was posted under
        edge: ReplyEdge,
    },
}

impl FeedMessage {
    pub fn ancestor_id(&self) -> CommentId {
        match self {
            FeedMessage::ReplyCreated { ancestor_id, .. } => *ancestor_id,
        }
    }
}
