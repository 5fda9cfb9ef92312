use std::{collections::HashMap, sync::Arc};

use crate::api::{Comment, CommentId, Cursor, FeedMessage, PageInfo, RepliesPage, ReplyEdge};

/// Normalized view of every comment and reply connection fetched so far
///
/// Cloning is cheap, and a clone is a consistent snapshot: later writes to
/// the cloned-from store do not show up in it.
#[derive(Clone, Debug, Default)]
pub struct Store {
    comments: Arc<HashMap<CommentId, Arc<Comment>>>,
    connections: Arc<HashMap<CommentId, Arc<ReplyConnection>>>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EdgeRef {
    pub cursor: Cursor,
    pub node: CommentId,
}

/// The `replies` connection of one comment
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReplyConnection {
    /// Replies in display order
    pub edges: Vec<EdgeRef>,

    /// Replies received live that the viewer did not reveal yet, disjoint from `edges`
    pub view_new_edges: Vec<EdgeRef>,

    pub page_info: PageInfo,

    /// Replies the viewer posted from this client, never paginated
    pub local_replies: Vec<CommentId>,

    /// Live replies received while pages were still unfetched, replayed once
    /// pagination is exhausted
    pub parked: Vec<ParkedReply>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParkedReply {
    pub ancestor: CommentId,
    pub edge: ReplyEdge,
    pub direct_insertion: bool,
}

impl ReplyConnection {
    pub fn contains(&self, id: &CommentId) -> bool {
        self.edges.iter().any(|e| e.node == *id) || self.view_new_edges.iter().any(|e| e.node == *id)
    }

    pub fn view_new_count(&self) -> usize {
        self.view_new_edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.view_new_edges.is_empty()
    }
}

/// What happened to a live reply pushed into the store
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Insertion {
    /// Appended to the parent's edges
    Inline,

    /// Held in the parent's view-new set
    ViewNew,

    /// Already known, nothing changed
    Duplicate,

    /// The parent still has unfetched pages, the reply waits until they are fetched
    Deferred,

    /// The parent's replies were never fetched
    UnknownParent,
}

impl Store {
    pub fn stub() -> Store {
        Store::default()
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Arc<Comment>> {
        self.comments.get(id)
    }

    pub fn connection(&self, id: &CommentId) -> Option<&Arc<ReplyConnection>> {
        self.connections.get(id)
    }

    pub fn has_more(&self, id: &CommentId) -> bool {
        self.connection(id)
            .map(|c| c.page_info.has_next_page)
            .unwrap_or(false)
    }

    pub fn view_new_count(&self, id: &CommentId) -> usize {
        self.connection(id).map(|c| c.view_new_count()).unwrap_or(0)
    }

    /// Resolve edges to their nodes, skipping the ones whose node is unknown
    pub fn resolve<'a>(
        &'a self,
        edges: &'a [EdgeRef],
    ) -> impl 'a + Iterator<Item = (&'a Cursor, &'a Arc<Comment>)> {
        edges.iter().filter_map(move |e| match self.comments.get(&e.node) {
            Some(c) => Some((&e.cursor, c)),
            None => {
                tracing::warn!(node = ?e.node, "edge points to a comment missing from the store");
                None
            }
        })
    }

    /// Insert or refresh a comment node
    ///
    /// Optional fields absent from `c` keep the value previously fetched
    /// through a larger selection.
    pub fn upsert_comment(&mut self, mut c: Comment) {
        let comments = Arc::make_mut(&mut self.comments);
        if let Some(prev) = comments.get(&c.id) {
            if c.reply_count.is_none() {
                c.reply_count = prev.reply_count;
            }
            if c.entered_live.is_none() {
                c.entered_live = prev.entered_live;
            }
        }
        comments.insert(c.id, Arc::new(c));
    }

    pub fn update_comment(&mut self, id: &CommentId, f: impl FnOnce(&mut Comment)) -> bool {
        match Arc::make_mut(&mut self.comments).get_mut(id) {
            None => false,
            Some(c) => {
                f(Arc::make_mut(c));
                true
            }
        }
    }

    fn connection_mut(&mut self, id: CommentId) -> &mut ReplyConnection {
        Arc::make_mut(
            Arc::make_mut(&mut self.connections)
                .entry(id)
                .or_insert_with(|| Arc::new(ReplyConnection::default())),
        )
    }

    /// Merge a page of replies, and recursively its nested pages
    ///
    /// `continuation` is true when the page was requested after the
    /// connection's end cursor. A first page never overwrites the page info
    /// of a connection that already holds edges.
    pub fn apply_page(&mut self, page: RepliesPage, continuation: bool) {
        let RepliesPage {
            comment,
            edges,
            page_info,
            nested,
        } = page;
        let parent = comment.id;
        self.upsert_comment(comment);

        let mut fresh = Vec::with_capacity(edges.len());
        for ReplyEdge { cursor, node } in edges {
            fresh.push(EdgeRef {
                cursor,
                node: node.id,
            });
            self.upsert_comment(node);
        }

        let conn = self.connection_mut(parent);
        let had_edges = !conn.edges.is_empty();
        for e in fresh {
            if !conn.contains(&e.node) {
                conn.edges.push(e);
            }
        }
        if continuation || !had_edges {
            let end_cursor = page_info.end_cursor.or_else(|| conn.page_info.end_cursor.take());
            conn.page_info = PageInfo {
                has_next_page: page_info.has_next_page,
                end_cursor,
            };
        }
        let replay = match conn.page_info.has_next_page {
            true => Vec::new(),
            false => std::mem::take(&mut conn.parked),
        };
        for p in replay {
            let res = self.insert_live_reply(p.ancestor, p.edge, p.direct_insertion);
            tracing::trace!(?parent, ?res, "replayed parked live reply");
        }

        for p in nested {
            self.apply_page(p, false);
        }
    }

    pub fn apply_feed_message(&mut self, msg: FeedMessage, direct_insertion: bool) -> Insertion {
        match msg {
            FeedMessage::ReplyCreated { ancestor_id, edge } => {
                self.insert_live_reply(ancestor_id, edge, direct_insertion)
            }
        }
    }

    /// Insert a reply received live under the reply tree of `ancestor`
    ///
    /// Only direct replies to the ancestor go through the view-new set, and
    /// only when `direct_insertion` is off; deeper replies are always inlined.
    pub fn insert_live_reply(
        &mut self,
        ancestor: CommentId,
        edge: ReplyEdge,
        direct_insertion: bool,
    ) -> Insertion {
        let parent = match edge.node.parent_id {
            Some(p) => p,
            None => return Insertion::UnknownParent,
        };
        let node = edge.node.id;
        let has_next_page = match self.connection(&parent) {
            None => return Insertion::UnknownParent,
            Some(conn) if conn.contains(&node) => return Insertion::Duplicate,
            Some(conn) => conn.page_info.has_next_page,
        };
        if has_next_page {
            let conn = self.connection_mut(parent);
            if conn.parked.iter().any(|p| p.edge.node.id == node) {
                return Insertion::Duplicate;
            }
            conn.parked.push(ParkedReply {
                ancestor,
                edge,
                direct_insertion,
            });
            return Insertion::Deferred;
        }

        self.upsert_comment(edge.node);
        self.update_comment(&parent, |c| {
            if let Some(n) = c.reply_count.as_mut() {
                *n += 1;
            }
        });
        let edge = EdgeRef {
            cursor: edge.cursor,
            node,
        };
        let conn = self.connection_mut(parent);
        if parent == ancestor && !direct_insertion {
            conn.view_new_edges.push(edge);
            Insertion::ViewNew
        } else {
            conn.edges.push(edge);
            Insertion::Inline
        }
    }

    /// Move the view-new set at the end of the edges, returns the number of
    /// edges actually moved
    pub fn merge_view_new(&mut self, id: CommentId) -> usize {
        if self.view_new_count(&id) == 0 {
            return 0;
        }
        let conn = self.connection_mut(id);
        let mut moved = 0;
        for e in std::mem::take(&mut conn.view_new_edges) {
            if !conn.edges.iter().any(|known| known.node == e.node) {
                conn.edges.push(e);
                moved += 1;
            }
        }
        moved
    }

    pub fn add_local_reply(&mut self, reply: Comment) -> anyhow::Result<()> {
        let parent = reply.parent_id.ok_or_else(|| {
            anyhow::anyhow!("local reply {:?} has no parent comment", reply.id)
        })?;
        if self.comment(&parent).is_none() {
            return Err(anyhow::anyhow!(
                "local reply {:?} targets comment {parent:?} that is not in store",
                reply.id
            ));
        }
        let id = reply.id;
        self.upsert_comment(reply);
        let conn = self.connection_mut(parent);
        if !conn.local_replies.contains(&id) {
            conn.local_replies.push(id);
        }
        Ok(())
    }
}
