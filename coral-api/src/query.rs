use crate::{Comment, CommentId, Cursor, ReplyEdge};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplySort {
    #[default]
    CreatedAtAsc,
    CreatedAtDesc,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum PageSize {
    First(u32),

    /// Everything after the cursor
    Remaining,
}

impl PageSize {
    pub fn limit(&self) -> Option<usize> {
        match self {
            PageSize::First(n) => Some(*n as usize),
            PageSize::Remaining => None,
        }
    }
}

/// Which optional fields of a reply node are requested, and how the node's
/// own replies get fetched in the same round trip
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Selection {
    pub reply_count: bool,
    pub entered_live: bool,
    pub replies: Option<Box<ConnectionSelection>>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ConnectionSelection {
    pub first: u32,
    pub order_by: ReplySort,
    pub node: Selection,
}

impl Selection {
    /// Whether everything `other` asks for is also asked for by `self`
    pub fn covers(&self, other: &Selection) -> bool {
        if (other.reply_count && !self.reply_count) || (other.entered_live && !self.entered_live) {
            return false;
        }
        match (&self.replies, &other.replies) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(mine), Some(theirs)) => {
                mine.order_by == theirs.order_by && mine.node.covers(&theirs.node)
            }
        }
    }

    /// Whether `deeper` is fully fetched as the nested connection of `self`
    pub fn embeds(&self, deeper: &Selection) -> bool {
        match &self.replies {
            None => false,
            Some(conn) => conn.node.covers(deeper),
        }
    }

    /// Strip the fields this selection did not ask for
    pub fn project(&self, comment: &mut Comment) {
        if !self.reply_count {
            comment.reply_count = None;
        }
        if !self.entered_live {
            comment.entered_live = None;
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RepliesQuery {
    pub comment_id: CommentId,
    pub first: PageSize,
    pub after: Option<Cursor>,
    pub order_by: ReplySort,

    /// Selection applied to each returned reply node
    pub selection: Selection,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<Cursor>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RepliesPage {
    /// The comment whose replies these are, as currently known by the data layer
    pub comment: Comment,
    pub edges: Vec<ReplyEdge>,
    pub page_info: PageInfo,

    /// First pages of the returned replies' own replies, when the selection
    /// requested a nested connection
    #[serde(default)]
    pub nested: Vec<RepliesPage>,
}
