use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::{
    api::CommentId,
    events::EventSink,
    level::{self, Level, LevelSpec, ReplySource, LEVELS},
    view::{RenderContext, ReplyListElement, ReplyListView, ReplyTree},
    Client, Error, LocalReplyList, ReplyListController, ReplyListProps, Store,
};

/// A mounted reply list, of whichever kind its depth calls for
#[derive(Clone)]
pub enum ReplyList {
    Remote(ReplyListController),
    Local(LocalReplyList),
}

impl ReplyList {
    pub fn depth(&self) -> u8 {
        match self {
            ReplyList::Remote(c) => c.depth(),
            ReplyList::Local(l) => l.depth(),
        }
    }

    pub fn view(&self, snapshot: &Store) -> Option<ReplyListView> {
        match self {
            ReplyList::Remote(c) => c.view(snapshot),
            ReplyList::Local(l) => l.view(snapshot),
        }
    }

    pub async fn show_all(&self) -> Result<(), Error> {
        match self {
            ReplyList::Remote(c) => c.show_all().await,
            ReplyList::Local(l) => l.show_all().await,
        }
    }

    pub fn as_remote(&self) -> Option<&ReplyListController> {
        match self {
            ReplyList::Remote(c) => Some(c),
            ReplyList::Local(_) => None,
        }
    }

    fn mount(&self) {
        if let ReplyList::Remote(c) = self {
            c.mount();
        }
    }

    fn update(&mut self, element: &ReplyListElement) {
        match self {
            ReplyList::Remote(c) => c.update(ReplyListProps::from_element(element)),
            ReplyList::Local(l) => l.update(element.clone()),
        }
    }

    fn unmount(&self) {
        if let ReplyList::Remote(c) = self {
            c.unmount();
        }
    }
}

/// Static wiring of the thread levels, built once at startup
#[derive(Clone)]
pub struct ThreadComposer {
    client: Client,
    events: Arc<dyn EventSink>,
    levels: Arc<Vec<LevelSpec>>,
}

impl ThreadComposer {
    pub fn new(client: Client, events: Arc<dyn EventSink>) -> Result<ThreadComposer, Error> {
        Self::with_levels(client, events, &LEVELS)
    }

    pub fn with_levels(
        client: Client,
        events: Arc<dyn EventSink>,
        levels: &[Level],
    ) -> Result<ThreadComposer, Error> {
        let levels = level::build(levels, client.config())?;
        tracing::debug!(levels = levels.len(), "built thread composer");
        Ok(ThreadComposer {
            client,
            events,
            levels: Arc::new(levels),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn level(&self, depth: u8) -> Result<&LevelSpec, Error> {
        usize::from(depth)
            .checked_sub(1)
            .and_then(|i| self.levels.get(i))
            .ok_or(Error::UnknownDepth(depth))
    }

    pub fn max_depth(&self) -> u8 {
        self.levels.len() as u8
    }

    pub fn root_element(&self, comment_id: CommentId, context: RenderContext) -> ReplyListElement {
        ReplyListElement {
            depth: 1,
            comment_id,
            context: Arc::new(context),
        }
    }

    /// Instantiate the reply list `element` refers to, not mounted yet
    pub fn controller_for(&self, element: &ReplyListElement) -> Result<ReplyList, Error> {
        let spec = self.level(element.depth)?.clone();
        Ok(match spec.level.source {
            ReplySource::Remote => {
                let next = (!spec.is_terminal).then(|| element.depth + 1);
                ReplyList::Remote(ReplyListController::new(
                    self.client.clone(),
                    self.events.clone(),
                    spec,
                    next,
                    ReplyListProps::from_element(element),
                ))
            }
            ReplySource::Local => ReplyList::Local(LocalReplyList::new(spec, element.clone())),
        })
    }

    pub fn thread(&self, comment_id: CommentId, context: RenderContext) -> Thread {
        Thread {
            composer: self.clone(),
            root: self.root_element(comment_id, context),
            mounted: HashMap::new(),
        }
    }
}

/// The reply tree of one top-level comment, with its mounted reply lists
pub struct Thread {
    composer: ThreadComposer,
    root: ReplyListElement,
    mounted: HashMap<(u8, CommentId), ReplyList>,
}

impl Thread {
    pub fn comment_id(&self) -> CommentId {
        self.root.comment_id
    }

    /// Fetch the first page of every remote level in one round trip
    pub async fn load(&self) -> Result<(), Error> {
        let spec = self.composer.level(self.root.depth)?;
        self.composer
            .client
            .fetch_replies(self.root.comment_id, spec.page_size, spec.selection.clone())
            .await
    }

    /// Change the context every list of the thread renders with
    pub fn set_context(&mut self, context: RenderContext) {
        self.root.context = Arc::new(context);
    }

    pub fn list(&self, depth: u8, comment_id: CommentId) -> Option<ReplyList> {
        self.mounted.get(&(depth, comment_id)).cloned()
    }

    pub fn root_list(&self) -> Option<ReplyListController> {
        self.list(self.root.depth, self.root.comment_id)
            .and_then(|l| l.as_remote().cloned())
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Resolve the whole tree from one snapshot
    ///
    /// Lists reached for the first time get mounted, lists still reached get
    /// their props refreshed, and lists no longer reached get unmounted.
    pub fn render(&mut self) -> Result<Option<ReplyTree>, Error> {
        let snapshot = self.composer.client.snapshot();
        let mut reached = HashSet::new();
        let root = self.root.clone();
        let tree = self.render_element(&snapshot, &root, &mut reached)?;

        let gone = self
            .mounted
            .keys()
            .filter(|k| !reached.contains(*k))
            .copied()
            .collect::<Vec<_>>();
        for key in gone {
            if let Some(list) = self.mounted.remove(&key) {
                tracing::trace!(depth = key.0, comment = ?key.1, "unmounting reply list");
                list.unmount();
            }
        }
        Ok(tree)
    }

    fn render_element(
        &mut self,
        snapshot: &Store,
        element: &ReplyListElement,
        reached: &mut HashSet<(u8, CommentId)>,
    ) -> Result<Option<ReplyTree>, Error> {
        let key = (element.depth, element.comment_id);
        reached.insert(key);
        let list = match self.mounted.get_mut(&key) {
            Some(list) => {
                list.update(element);
                list.clone()
            }
            None => {
                let list = self.composer.controller_for(element)?;
                list.mount();
                self.mounted.insert(key, list.clone());
                list
            }
        };

        let view = match list.view(snapshot) {
            None => return Ok(None),
            Some(view) => view,
        };
        let mut nested = Vec::with_capacity(view.comments.len());
        for reply in view.comments.iter() {
            nested.push(match &reply.replies {
                None => None,
                Some(child) => self.render_element(snapshot, child, reached)?,
            });
        }
        Ok(Some(ReplyTree { view, nested }))
    }

    pub fn unmount(&mut self) {
        for (_, list) in self.mounted.drain() {
            list.unmount();
        }
    }
}

impl Drop for Thread {
    fn drop(&mut self) {
        self.unmount();
    }
}
