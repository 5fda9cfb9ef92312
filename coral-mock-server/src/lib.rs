use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use futures::channel::mpsc;
use parking_lot::Mutex;

use coral_api::{
    validate_string, Comment, CommentId, CommentStatus, Cursor, DataLayer, Error, FeedMessage,
    PageInfo, PageSize, RepliesPage, RepliesQuery, ReplyCreatedVariables, ReplyEdge, ReplyFeed,
    ReplySort, Selection, Settings, Story, UserId, Uuid,
};

mod fixture;
pub use fixture::Fixture;

/// In-memory data layer serving a single story
pub struct MockServer(Mutex<State>);

#[derive(Debug)]
struct State {
    story: Story,
    settings: Settings,
    comments: BTreeMap<CommentId, Comment>,
    feeds: Vec<(CommentId, mpsc::UnboundedSender<FeedMessage>)>,
    failures: VecDeque<Error>,
    fetch_calls: usize,
    subscribe_calls: usize,
    view_new_calls: usize,
}

fn cursor(c: &Comment) -> Cursor {
    Cursor(format!(
        "{}|{}",
        c.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
        c.id.0
    ))
}

fn parse_cursor(c: &Cursor) -> Result<CommentId, Error> {
    c.0.split_once('|')
        .and_then(|(_, id)| Uuid::parse_str(id).ok())
        .map(CommentId)
        .ok_or_else(|| Error::Unknown(format!("invalid cursor {:?}", c.0)))
}

impl State {
    fn relay(&mut self, msg: FeedMessage) {
        let ancestor = msg.ancestor_id();
        self.feeds.retain_mut(|(watched, f)| {
            *watched != ancestor || matches!(f.unbounded_send(msg.clone()), Ok(()))
        });
    }

    fn replies_of(&self, parent: CommentId, order_by: ReplySort) -> Vec<&Comment> {
        let mut res = self
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent) && c.status.is_published())
            .collect::<Vec<_>>();
        res.sort_by_key(|c| (c.created_at, c.id));
        if order_by == ReplySort::CreatedAtDesc {
            res.reverse();
        }
        res
    }

    fn project(&self, c: &Comment, selection: &Selection) -> Comment {
        let mut node = c.clone();
        node.reply_count = Some(self.replies_of(c.id, ReplySort::CreatedAtAsc).len() as u32);
        node.entered_live = Some(c.entered_live.unwrap_or(false));
        selection.project(&mut node);
        node
    }

    fn page(
        &self,
        comment_id: CommentId,
        first: PageSize,
        after: Option<&Cursor>,
        order_by: ReplySort,
        selection: &Selection,
    ) -> Result<RepliesPage, Error> {
        let comment = self
            .comments
            .get(&comment_id)
            .ok_or(Error::CommentNotFound(comment_id))?;
        let replies = self.replies_of(comment_id, order_by);
        let start = match after {
            None => 0,
            Some(after) => {
                let after = parse_cursor(after)?;
                replies
                    .iter()
                    .position(|c| c.id == after)
                    .map(|i| i + 1)
                    .ok_or_else(|| Error::Unknown(format!("cursor {after:?} is not a reply")))?
            }
        };
        let rest = &replies[start..];
        let taken = &rest[..first.limit().unwrap_or(rest.len()).min(rest.len())];

        let mut nested = Vec::new();
        if let Some(conn) = &selection.replies {
            for c in taken {
                nested.push(self.page(
                    c.id,
                    PageSize::First(conn.first),
                    None,
                    conn.order_by,
                    &conn.node,
                )?);
            }
        }
        Ok(RepliesPage {
            comment: self.project(comment, &Selection::default()),
            edges: taken
                .iter()
                .map(|c| ReplyEdge {
                    cursor: cursor(c),
                    node: self.project(c, selection),
                })
                .collect(),
            page_info: PageInfo {
                has_next_page: taken.len() < rest.len(),
                end_cursor: taken.last().map(|c| cursor(c)).or_else(|| after.cloned()),
            },
            nested,
        })
    }

    /// Top-level comment of the thread `id` belongs to
    fn root_of(&self, mut id: CommentId) -> Option<CommentId> {
        for _ in 0..=self.comments.len() {
            match self.comments.get(&id)?.parent_id {
                None => return Some(id),
                Some(p) => id = p,
            }
        }
        None
    }
}

impl MockServer {
    pub fn new(story: Story) -> MockServer {
        MockServer(Mutex::new(State {
            story,
            settings: Settings::default(),
            comments: BTreeMap::new(),
            feeds: Vec::new(),
            failures: VecDeque::new(),
            fetch_calls: 0,
            subscribe_calls: 0,
            view_new_calls: 0,
        }))
    }

    pub fn from_fixture(fixture: &Fixture) -> anyhow::Result<MockServer> {
        let server = MockServer::new(fixture.story.clone());
        {
            let mut state = server.0.lock();
            state.settings = fixture.settings.clone();
            for c in fixture.comments.iter() {
                if state.comments.insert(c.id, c.clone()).is_some() {
                    anyhow::bail!("comment {:?} appears twice in the fixture", c.id);
                }
            }
            for c in state.comments.values() {
                if state.root_of(c.id).is_none() {
                    anyhow::bail!("comment {:?} does not belong to a thread", c.id);
                }
            }
        }
        Ok(server)
    }

    pub fn story(&self) -> Story {
        self.0.lock().story.clone()
    }

    pub fn settings(&self) -> Settings {
        self.0.lock().settings.clone()
    }

    pub fn set_story(&self, story: Story) {
        self.0.lock().story = story;
    }

    pub fn comment(&self, id: CommentId) -> Option<Comment> {
        self.0.lock().comments.get(&id).cloned()
    }

    /// Top-level comments, oldest first
    pub fn top_level(&self) -> Vec<Comment> {
        let mut res = self
            .0
            .lock()
            .comments
            .values()
            .filter(|c| c.parent_id.is_none())
            .cloned()
            .collect::<Vec<_>>();
        res.sort_by_key(|c| (c.created_at, c.id));
        res
    }

    /// Post a new comment, and relay it to the live feeds watching its thread
    pub async fn post(&self, parent: Option<CommentId>, body: &str) -> Result<Comment, Error> {
        validate_string(body)?;
        let mut state = self.0.lock();
        if state.story.is_closed {
            return Err(Error::StoryClosed);
        }
        if state.settings.commenting_disabled() {
            return Err(Error::CommentingDisabled);
        }
        if let Some(p) = parent {
            if !state.comments.contains_key(&p) {
                return Err(Error::CommentNotFound(p));
            }
        }
        let now = Utc::now();
        let created_at = match state.comments.values().map(|c| c.created_at).max() {
            Some(last) if last >= now => last + Duration::microseconds(1),
            _ => now,
        };
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            story_id: state.story.id,
            parent_id: parent,
            author_id: Some(UserId::stub()),
            body: String::from(body),
            created_at,
            status: CommentStatus::None,
            last_viewer_action: None,
            reply_count: None,
            entered_live: Some(true),
        };
        state.comments.insert(comment.id, comment.clone());
        if parent.is_some() {
            if let Some(ancestor_id) = state.root_of(comment.id) {
                let edge = ReplyEdge {
                    cursor: cursor(&comment),
                    node: state.project(&comment, &Selection::default()),
                };
                tracing::trace!(?ancestor_id, reply = ?comment.id, "relaying new reply");
                state.relay(FeedMessage::ReplyCreated { ancestor_id, edge });
            }
        }
        Ok(comment)
    }

    pub fn set_status(&self, id: CommentId, status: CommentStatus) -> bool {
        match self.0.lock().comments.get_mut(&id) {
            None => false,
            Some(c) => {
                c.status = status;
                true
            }
        }
    }

    /// Make the next data layer call fail with `err`
    pub fn test_fail_next(&self, err: Error) {
        self.0.lock().failures.push_back(err);
    }

    pub fn test_fetch_calls(&self) -> usize {
        self.0.lock().fetch_calls
    }

    pub fn test_subscribe_calls(&self) -> usize {
        self.0.lock().subscribe_calls
    }

    pub fn test_view_new_calls(&self) -> usize {
        self.0.lock().view_new_calls
    }

    /// Number of live feeds whose receiving end is still alive
    pub fn test_open_feeds(&self) -> usize {
        let mut state = self.0.lock();
        state.feeds.retain(|(_, f)| !f.is_closed());
        state.feeds.len()
    }
}

#[async_trait]
impl DataLayer for MockServer {
    async fn fetch_replies(&self, query: RepliesQuery) -> Result<RepliesPage, Error> {
        // let concurrent callers interleave, like over a real network
        tokio::task::yield_now().await;
        let mut state = self.0.lock();
        state.fetch_calls += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        state.page(
            query.comment_id,
            query.first,
            query.after.as_ref(),
            query.order_by,
            &query.selection,
        )
    }

    async fn view_new_replies(&self, comment: CommentId) -> Result<(), Error> {
        tokio::task::yield_now().await;
        let mut state = self.0.lock();
        state.view_new_calls += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        match state.comments.contains_key(&comment) {
            true => Ok(()),
            false => Err(Error::CommentNotFound(comment)),
        }
    }

    async fn subscribe_reply_created(
        &self,
        vars: ReplyCreatedVariables,
    ) -> Result<ReplyFeed, Error> {
        let mut state = self.0.lock();
        state.subscribe_calls += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        if !state.comments.contains_key(&vars.ancestor_id) {
            return Err(Error::CommentNotFound(vars.ancestor_id));
        }
        let (sender, receiver) = mpsc::unbounded();
        state.feeds.push((vars.ancestor_id, sender));
        Ok(receiver)
    }
}
