use coral_client::{api::CommentId, ReplyTree};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Violation {
    /// A reply with nothing to read
    EmptyBody { comment: CommentId },

    /// A list rendered deeper than the thread levels allow
    TooDeep { comment: CommentId, depth: u8 },

    /// A reply offered a nested list past the terminal depth
    NestedPastTerminal { comment: CommentId, depth: u8 },
}

/// Inspects every resolved reply tree and logs what a reader would trip on
pub struct Auditor {
    max_depth: u8,
}

impl Auditor {
    pub fn new(max_depth: u8) -> Auditor {
        Auditor { max_depth }
    }

    pub fn check(&self, tree: &ReplyTree) -> Vec<Violation> {
        let mut res = Vec::new();
        tree.walk(&mut |depth, reply| {
            let comment = reply.comment.id;
            if reply.comment.body.trim().is_empty() {
                res.push(Violation::EmptyBody { comment });
            }
            if depth > self.max_depth {
                res.push(Violation::TooDeep { comment, depth });
            }
            if depth >= self.max_depth && reply.replies.is_some() {
                res.push(Violation::NestedPastTerminal { comment, depth });
            }
        });
        res
    }

    /// Returns the number of violations found
    pub fn inspect(&self, tree: &ReplyTree) -> usize {
        let violations = self.check(tree);
        for v in violations.iter() {
            tracing::warn!(violation = ?v, "reply tree audit failed");
        }
        violations.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use coral_client::{
        api::{Comment, CommentStatus, Settings, Story, Uuid},
        RenderContext, ReplyListElement, ReplyListView, VisibleReply,
    };

    use super::*;

    fn reply(body: &str, nested_depth: Option<u8>) -> VisibleReply {
        let id = CommentId(Uuid::new_v4());
        VisibleReply {
            cursor: None,
            comment: Arc::new(Comment {
                id,
                story_id: Story::stub().id,
                parent_id: Some(CommentId::stub()),
                author_id: None,
                body: String::from(body),
                created_at: Utc::now(),
                status: CommentStatus::None,
                last_viewer_action: None,
                reply_count: None,
                entered_live: None,
            }),
            replies: nested_depth.map(|depth| ReplyListElement {
                depth,
                comment_id: id,
                context: Arc::new(RenderContext {
                    viewer: None,
                    story: Story::stub(),
                    settings: Settings::default(),
                    live_direct_replies_insertion: false,
                }),
            }),
            show_conversation_link: false,
        }
    }

    fn tree(depth: u8, comments: Vec<VisibleReply>) -> ReplyTree {
        ReplyTree {
            nested: comments.iter().map(|_| None).collect(),
            view: ReplyListView {
                comment_id: CommentId::stub(),
                comments,
                has_more: false,
                disable_show_all: false,
                indent_level: depth,
                local_reply: false,
                view_new_count: 0,
            },
        }
    }

    #[test]
    fn clean_tree_passes() {
        let auditor = Auditor::new(4);
        assert_eq!(auditor.inspect(&tree(1, vec![reply("hello", Some(2))])), 0);
    }

    #[test]
    fn reports_each_violation() {
        let auditor = Auditor::new(4);
        let empty = reply("  ", Some(2));
        let empty_id = empty.comment.id;
        assert_eq!(
            auditor.check(&tree(1, vec![empty])),
            vec![Violation::EmptyBody { comment: empty_id }]
        );

        let deep = reply("deep", Some(5));
        let deep_id = deep.comment.id;
        assert_eq!(
            auditor.check(&tree(4, vec![deep])),
            vec![Violation::NestedPastTerminal {
                comment: deep_id,
                depth: 4
            }]
        );

        let deeper = reply("deeper", None);
        let deeper_id = deeper.comment.id;
        assert_eq!(
            auditor.check(&tree(5, vec![deeper])),
            vec![Violation::TooDeep {
                comment: deeper_id,
                depth: 5
            }]
        );
    }
}
