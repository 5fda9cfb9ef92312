use std::sync::Arc;

use crate::api::{Comment, CommentId, Cursor, Settings, Story, Viewer};

/// Context every nested list of a thread is rendered with
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderContext {
    pub viewer: Option<Viewer>,
    pub story: Story,
    pub settings: Settings,
    pub live_direct_replies_insertion: bool,
}

/// Reference to the list of replies of `comment_id`, rendered at `depth`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyListElement {
    pub depth: u8,
    pub comment_id: CommentId,
    pub context: Arc<RenderContext>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisibleReply {
    pub cursor: Option<Cursor>,

    /// Node as seen through the level's selection
    pub comment: Arc<Comment>,

    /// Replies to this reply, `None` past the terminal depth
    pub replies: Option<ReplyListElement>,

    pub show_conversation_link: bool,
}

/// Everything the presentation layer needs to draw one reply list
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyListView {
    pub comment_id: CommentId,
    pub comments: Vec<VisibleReply>,
    pub has_more: bool,
    pub disable_show_all: bool,
    pub indent_level: u8,
    pub local_reply: bool,
    pub view_new_count: usize,
}

/// A reply list with its nested lists resolved from the same snapshot
///
/// `nested[i]` holds the resolved replies of `view.comments[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplyTree {
    pub view: ReplyListView,
    pub nested: Vec<Option<ReplyTree>>,
}

impl ReplyTree {
    /// Number of replies in the whole tree
    pub fn len(&self) -> usize {
        self.view.comments.len()
            + self
                .nested
                .iter()
                .flatten()
                .map(|t| t.len())
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every resolved reply with its depth, parents before children
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(u8, &'a VisibleReply)) {
        for (reply, nested) in self.view.comments.iter().zip(self.nested.iter()) {
            f(self.view.indent_level, reply);
            if let Some(nested) = nested {
                nested.walk(f);
            }
        }
    }
}
