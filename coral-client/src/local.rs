use std::sync::Arc;

use crate::{
    api::CommentId,
    level::LevelSpec,
    view::{ReplyListElement, ReplyListView, VisibleReply},
    Error, Store,
};

/// Reply list of the terminal depth
///
/// Only shows the replies the viewer posted from this client: there is no
/// pagination and no live update this deep in a thread.
#[derive(Clone, Debug)]
pub struct LocalReplyList {
    spec: LevelSpec,
    element: ReplyListElement,
}

impl LocalReplyList {
    pub fn new(spec: LevelSpec, element: ReplyListElement) -> LocalReplyList {
        LocalReplyList { spec, element }
    }

    pub fn depth(&self) -> u8 {
        self.spec.depth()
    }

    pub fn comment_id(&self) -> CommentId {
        self.element.comment_id
    }

    pub fn update(&mut self, element: ReplyListElement) {
        self.element = element;
    }

    /// Everything is always shown already
    pub async fn show_all(&self) -> Result<(), Error> {
        Ok(())
    }

    pub fn visible_replies(&self, snapshot: &Store) -> Vec<VisibleReply> {
        let comment_id = self.comment_id();
        let hidden = snapshot
            .comment(&comment_id)
            .map(|c| c.is_hidden_after_viewer_action())
            .unwrap_or(false);
        let conn = match snapshot.connection(&comment_id) {
            Some(conn) if !hidden => conn,
            _ => return Vec::new(),
        };
        conn.local_replies
            .iter()
            .filter_map(|id| snapshot.comment(id))
            .map(|c| {
                let mut node = (**c).clone();
                self.spec.selection.project(&mut node);
                VisibleReply {
                    cursor: None,
                    comment: Arc::new(node),
                    replies: None,
                    show_conversation_link: false,
                }
            })
            .collect()
    }

    pub fn view(&self, snapshot: &Store) -> Option<ReplyListView> {
        let comments = self.visible_replies(snapshot);
        let has_local = snapshot
            .connection(&self.comment_id())
            .map(|c| !c.local_replies.is_empty())
            .unwrap_or(false);
        if !has_local {
            return None;
        }
        Some(ReplyListView {
            comment_id: self.comment_id(),
            comments,
            has_more: false,
            disable_show_all: false,
            indent_level: self.depth(),
            local_reply: self.spec.level.local_reply,
            view_new_count: 0,
        })
    }
}
