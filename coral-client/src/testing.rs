use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use coral_mock_server::MockServer;
use tokio::sync::Notify;

use crate::{
    api::{
        Comment, CommentId, CommentStatus, DataLayer, Error as ApiError, RepliesPage,
        RepliesQuery, ReplyCreatedVariables, ReplyFeed, Settings, Story, Uuid,
    },
    events::testing::RecordingSink,
    Client, ClientConfig, EventSink, RenderContext, ThreadComposer,
};

pub struct Harness {
    pub server: Arc<MockServer>,
    pub client: Client,
    pub events: Arc<RecordingSink>,
    pub composer: ThreadComposer,
}

impl Harness {
    pub fn new(config: ClientConfig) -> Harness {
        Self::over(config, |server| server as Arc<dyn DataLayer>)
    }

    /// Build a harness whose client talks to `data`, itself built upon the mock server
    pub fn over(
        config: ClientConfig,
        data: impl FnOnce(Arc<MockServer>) -> Arc<dyn DataLayer>,
    ) -> Harness {
        let server = Arc::new(MockServer::new(Story::stub()));
        let client = Client::new(data(server.clone()), config);
        let events = Arc::new(RecordingSink::default());
        let sink: Arc<dyn EventSink> = events.clone();
        let composer = ThreadComposer::new(client.clone(), sink).expect("default levels are valid");
        Harness {
            server,
            client,
            events,
            composer,
        }
    }

    pub fn context(&self) -> RenderContext {
        RenderContext {
            viewer: None,
            story: self.server.story(),
            settings: Settings::default(),
            live_direct_replies_insertion: self.client.config().live_direct_replies_insertion,
        }
    }

    /// Post a top-level comment with `n` replies
    pub async fn thread(&self, n: usize) -> (Comment, Vec<Comment>) {
        let top = self.server.post(None, "top").await.unwrap();
        let mut replies = Vec::new();
        for i in 0..n {
            replies.push(self.server.post(Some(top.id), &format!("reply {i}")).await.unwrap());
        }
        (top, replies)
    }
}

/// Let the spawned feed pumps catch up
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn local_reply(parent: CommentId, body: &str) -> Comment {
    Comment {
        id: CommentId(Uuid::new_v4()),
        story_id: Story::stub().id,
        parent_id: Some(parent),
        author_id: None,
        body: String::from(body),
        created_at: Utc::now(),
        status: CommentStatus::None,
        last_viewer_action: None,
        reply_count: None,
        entered_live: None,
    }
}

/// Data layer that can hold fetched pages back after the server built them
pub struct GatedLayer {
    inner: Arc<MockServer>,
    hold: AtomicBool,
    gate: Notify,
}

impl GatedLayer {
    pub fn new(inner: Arc<MockServer>) -> GatedLayer {
        GatedLayer {
            inner,
            hold: AtomicBool::new(false),
            gate: Notify::new(),
        }
    }

    /// Hold back the next pages until `release` gets called
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }
}

#[async_trait]
impl DataLayer for GatedLayer {
    async fn fetch_replies(&self, query: RepliesQuery) -> Result<RepliesPage, ApiError> {
        let page = self.inner.fetch_replies(query).await;
        if self.hold.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        page
    }

    async fn view_new_replies(&self, comment: CommentId) -> Result<(), ApiError> {
        self.inner.view_new_replies(comment).await
    }

    async fn subscribe_reply_created(
        &self,
        vars: ReplyCreatedVariables,
    ) -> Result<ReplyFeed, ApiError> {
        self.inner.subscribe_reply_created(vars).await
    }
}
