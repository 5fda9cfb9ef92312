use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{
    api::{CommentId, PageSize, ReplyCreatedVariables, Settings, Story, Viewer},
    events::{self, EventSink, ViewerNetworkEvent},
    level::LevelSpec,
    subscription::Subscription,
    view::{RenderContext, ReplyListElement, ReplyListView, VisibleReply},
    Client, Connection, Error, Store,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyListProps {
    pub comment_id: CommentId,
    pub story: Story,
    pub settings: Settings,
    pub viewer: Option<Viewer>,
    pub live_direct_replies_insertion: bool,
}

impl ReplyListProps {
    pub fn from_element(element: &ReplyListElement) -> ReplyListProps {
        ReplyListProps {
            comment_id: element.comment_id,
            story: element.context.story.clone(),
            settings: element.context.settings.clone(),
            viewer: element.context.viewer.clone(),
            live_direct_replies_insertion: element.context.live_direct_replies_insertion,
        }
    }

    fn context(&self) -> RenderContext {
        RenderContext {
            viewer: self.viewer.clone(),
            story: self.story.clone(),
            settings: self.settings.clone(),
            live_direct_replies_insertion: self.live_direct_replies_insertion,
        }
    }
}

/// Inputs of the live-replies effect; the effect re-runs whenever they change
#[derive(Clone, Debug, Eq, PartialEq)]
struct LiveDeps {
    comment_id: CommentId,
    depth: u8,
    live_direct_replies_insertion: bool,
    live_enabled: bool,
    has_more: bool,
    is_closed: bool,
    commenting_disabled: bool,
}

impl LiveDeps {
    fn should_subscribe(&self) -> bool {
        self.live_enabled && !self.is_closed && !self.commenting_disabled && self.depth == 1
    }
}

#[derive(Default)]
struct LiveEffect {
    deps: Option<LiveDeps>,
    subscription: Option<Subscription>,
}

impl LiveEffect {
    fn dispose(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.dispose();
        }
    }
}

struct Inner {
    client: Client,
    events: Arc<dyn EventSink>,
    spec: LevelSpec,
    next: Option<u8>,
    props: Mutex<ReplyListProps>,
    loading: AtomicBool,
    mounted: AtomicBool,

    /// Bumped on every unmount, so that late results of a previous mount are dropped
    generation: AtomicU64,
    live: Mutex<LiveEffect>,
}

/// Clears the loading flag when dropped, unless the list got unmounted since
struct LoadingGuard<'a> {
    inner: &'a Inner,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.inner.generation.load(Ordering::SeqCst) == self.generation {
            self.inner.loading.store(false, Ordering::SeqCst);
        }
    }
}

/// Reply list of one comment at one remote depth of the thread
#[derive(Clone)]
pub struct ReplyListController(Arc<Inner>);

impl ReplyListController {
    /// `next` is the depth nested reply lists are rendered at, if any
    pub fn new(
        client: Client,
        events: Arc<dyn EventSink>,
        spec: LevelSpec,
        next: Option<u8>,
        props: ReplyListProps,
    ) -> ReplyListController {
        ReplyListController(Arc::new(Inner {
            client,
            events,
            spec,
            next,
            props: Mutex::new(props),
            loading: AtomicBool::new(false),
            mounted: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            live: Mutex::new(LiveEffect::default()),
        }))
    }

    pub fn depth(&self) -> u8 {
        self.0.spec.depth()
    }

    pub fn comment_id(&self) -> CommentId {
        self.0.props.lock().comment_id
    }

    pub fn props(&self) -> ReplyListProps {
        self.0.props.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.0.loading.load(Ordering::SeqCst)
    }

    pub fn is_mounted(&self) -> bool {
        self.0.mounted.load(Ordering::SeqCst)
    }

    pub fn has_live_subscription(&self) -> bool {
        self.0
            .live
            .lock()
            .subscription
            .as_ref()
            .map(|s| s.is_active())
            .unwrap_or(false)
    }

    fn connection(&self) -> Connection {
        self.0
            .client
            .connection(self.comment_id(), self.0.spec.selection.clone())
    }

    pub fn has_more(&self) -> bool {
        self.connection().has_more()
    }

    pub fn mount(&self) {
        if self.0.mounted.swap(true, Ordering::SeqCst) {
            return;
        }
        self.0.loading.store(false, Ordering::SeqCst);
        self.subscribe_to_live_replies();
    }

    pub fn update(&self, props: ReplyListProps) {
        *self.0.props.lock() = props;
        self.subscribe_to_live_replies();
    }

    pub fn unmount(&self) {
        if !self.0.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        self.0.generation.fetch_add(1, Ordering::SeqCst);
        let mut live = self.0.live.lock();
        live.dispose();
        live.deps = None;
    }

    /// Re-evaluate the live-replies effect
    ///
    /// Nothing happens while the dependencies are unchanged. Otherwise the
    /// previous subscription is disposed before a new one is maybe registered.
    pub fn subscribe_to_live_replies(&self) {
        if !self.is_mounted() {
            return;
        }
        let props = self.props();
        let deps = LiveDeps {
            comment_id: props.comment_id,
            depth: self.depth(),
            live_direct_replies_insertion: props.live_direct_replies_insertion,
            live_enabled: props.story.live_enabled(),
            has_more: self.has_more(),
            is_closed: props.story.is_closed,
            commenting_disabled: props.settings.commenting_disabled(),
        };
        let mut live = self.0.live.lock();
        if live.deps.as_ref() == Some(&deps) {
            return;
        }
        live.dispose();
        if deps.should_subscribe() {
            live.subscription = Some(self.0.client.subscribe_reply_created(
                ReplyCreatedVariables {
                    ancestor_id: deps.comment_id,
                    live_direct_replies_insertion: deps.live_direct_replies_insertion,
                },
            ));
        }
        live.deps = Some(deps);
    }

    /// Load every remaining reply
    ///
    /// A call made while a previous one is still loading returns immediately.
    /// Dropping the returned future before it resolves cancels the load.
    pub async fn show_all(&self) -> Result<(), Error> {
        if self.0.loading.swap(true, Ordering::SeqCst) {
            tracing::debug!(comment = ?self.comment_id(), "show all already in flight");
            return Ok(());
        }
        let generation = self.0.generation.load(Ordering::SeqCst);
        let guard = LoadingGuard {
            inner: &self.0,
            generation,
        };
        let comment_id = self.comment_id();
        let event = events::begin(
            &self.0.events,
            ViewerNetworkEvent::ShowAllReplies { comment_id },
        );
        let res = self.connection().load_more(PageSize::Remaining).await;
        if generation != self.0.generation.load(Ordering::SeqCst) {
            tracing::debug!(?comment_id, "discarding show all result of an unmounted list");
            return Ok(());
        }
        drop(guard);
        match res {
            Ok(()) => {
                event.success();
                self.subscribe_to_live_replies();
                Ok(())
            }
            Err(err) => {
                event.error(err.to_string(), err.code());
                tracing::error!(?err, ?comment_id, "failed loading all replies");
                Err(err)
            }
        }
    }

    /// Mark the view-new replies as seen; failures are only logged
    pub async fn acknowledge_new_replies(&self) {
        let comment_id = self.comment_id();
        if let Err(err) = self.0.client.view_new_replies(comment_id).await {
            tracing::warn!(?err, ?comment_id, "failed marking new replies as viewed");
        }
    }

    pub fn view_new_count(&self, snapshot: &Store) -> usize {
        snapshot.view_new_count(&self.comment_id())
    }

    pub fn visible_replies(&self, snapshot: &Store) -> Vec<VisibleReply> {
        let props = self.props();
        let conn = match snapshot.connection(&props.comment_id) {
            Some(conn) if !conn.is_empty() => conn,
            _ => return Vec::new(),
        };
        let hidden = snapshot
            .comment(&props.comment_id)
            .map(|c| c.is_hidden_after_viewer_action())
            .unwrap_or(false);
        if hidden {
            return Vec::new();
        }
        let context = Arc::new(props.context());
        let selection = &self.0.spec.selection;
        snapshot
            .resolve(&conn.edges)
            .map(|(cursor, node)| {
                let mut node = (**node).clone();
                selection.project(&mut node);
                let replies = self.0.next.map(|depth| ReplyListElement {
                    depth,
                    comment_id: node.id,
                    context: context.clone(),
                });
                VisibleReply {
                    cursor: Some(cursor.clone()),
                    show_conversation_link: node.reply_count.map(|n| n > 0).unwrap_or(false),
                    comment: Arc::new(node),
                    replies,
                }
            })
            .collect()
    }

    /// `None` when there is nothing to render at all
    pub fn view(&self, snapshot: &Store) -> Option<ReplyListView> {
        let comment_id = self.comment_id();
        let conn = snapshot.connection(&comment_id)?;
        if conn.is_empty() {
            return None;
        }
        Some(ReplyListView {
            comment_id,
            comments: self.visible_replies(snapshot),
            has_more: conn.page_info.has_next_page,
            disable_show_all: self.is_loading(),
            indent_level: self.depth(),
            local_reply: self.0.spec.level.local_reply,
            view_new_count: conn.view_new_count(),
        })
    }
}
