use std::sync::Arc;

use futures::{select, FutureExt, StreamExt};
use parking_lot::Mutex;

use crate::{
    api::{
        Comment, CommentId, DataLayer, PageSize, RepliesQuery, ReplyCreatedVariables, Selection,
    },
    store::Insertion,
    subscription::{Registry, Subscription},
    ClientConfig, Error, Store,
};

/// Owner and only writer of the store
///
/// Everything that changes cached data (pages, mutation results, live pushes,
/// local replies) goes through here.
#[derive(Clone)]
pub struct Client {
    data: Arc<dyn DataLayer>,
    store: Arc<Mutex<Store>>,
    subscriptions: Registry,
    config: ClientConfig,
}

impl Client {
    pub fn new(data: Arc<dyn DataLayer>, config: ClientConfig) -> Client {
        Client {
            data,
            store: Arc::new(Mutex::new(Store::stub())),
            subscriptions: Registry::default(),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Store {
        self.store.lock().clone()
    }

    /// Fetch the first page of `comment`'s replies, along with all the nested
    /// pages `selection` asks for
    pub async fn fetch_replies(
        &self,
        comment: CommentId,
        first: PageSize,
        selection: Selection,
    ) -> Result<(), Error> {
        let page = self
            .data
            .fetch_replies(RepliesQuery {
                comment_id: comment,
                first,
                after: None,
                order_by: self.config.order_by,
                selection,
            })
            .await?;
        tracing::debug!(?comment, edges = page.edges.len(), "fetched replies");
        self.store.lock().apply_page(page, false);
        Ok(())
    }

    pub fn connection(&self, comment: CommentId, selection: Selection) -> Connection {
        Connection {
            client: self.clone(),
            comment,
            selection,
        }
    }

    /// Mark the view-new replies of `comment` as seen, then reveal them
    pub async fn view_new_replies(&self, comment: CommentId) -> Result<usize, Error> {
        self.data.view_new_replies(comment).await?;
        let moved = self.store.lock().merge_view_new(comment);
        tracing::debug!(?comment, moved, "revealed new replies");
        Ok(moved)
    }

    /// Register a live subscription; returns immediately, the feed is pumped
    /// into the store in the background until the handle is disposed
    pub fn subscribe_reply_created(&self, vars: ReplyCreatedVariables) -> Subscription {
        let (sub, cancelled) = self.subscriptions.register(vars);
        let id = sub.id();
        let data = self.data.clone();
        let store = self.store.clone();
        let registry = self.subscriptions.clone();
        tokio::spawn(async move {
            let mut cancelled = cancelled.fuse();
            let feed = select! {
                _ = cancelled => return,
                feed = data.subscribe_reply_created(vars).fuse() => feed,
            };
            let mut feed = match feed {
                Ok(feed) => feed.fuse(),
                Err(err) => {
                    tracing::error!(?err, ?vars, "failed subscribing to new replies");
                    registry.forget(id);
                    return;
                }
            };
            tracing::debug!(?vars, "subscribed to new replies");
            loop {
                select! {
                    _ = cancelled => return,
                    msg = feed.next() => match msg {
                        None => {
                            tracing::warn!(?vars, "reply feed closed by the data layer");
                            registry.forget(id);
                            return;
                        }
                        Some(msg) => {
                            let res = store
                                .lock()
                                .apply_feed_message(msg, vars.live_direct_replies_insertion);
                            match res {
                                Insertion::UnknownParent => {
                                    tracing::debug!(?vars, "dropping live reply to an unfetched comment")
                                }
                                res => tracing::trace!(?vars, ?res, "applied live reply"),
                            }
                        }
                    },
                }
            }
        });
        sub
    }

    pub fn active_subscriptions(&self) -> Vec<ReplyCreatedVariables> {
        self.subscriptions.active()
    }

    /// Insert a reply the viewer just posted, so it shows at the terminal depth
    pub fn add_local_reply(&self, reply: Comment) -> Result<(), Error> {
        crate::api::validate_string(&reply.body)?;
        self.store.lock().add_local_reply(reply)?;
        Ok(())
    }

    /// Apply the effect of a viewer moderation action on a cached comment
    pub fn record_viewer_action(
        &self,
        comment: CommentId,
        action: crate::api::ViewerAction,
        status: crate::api::CommentStatus,
    ) -> bool {
        self.store.lock().update_comment(&comment, |c| {
            c.last_viewer_action = Some(action);
            c.status = status;
        })
    }
}

/// Pagination capability over the replies of one comment
#[derive(Clone)]
pub struct Connection {
    client: Client,
    comment: CommentId,
    selection: Selection,
}

impl Connection {
    pub fn comment(&self) -> CommentId {
        self.comment
    }

    pub fn has_more(&self) -> bool {
        self.client.store.lock().has_more(&self.comment)
    }

    /// Fetch the next `size` replies after the last known cursor
    pub async fn load_more(&self, size: PageSize) -> Result<(), Error> {
        let after = self
            .client
            .store
            .lock()
            .connection(&self.comment)
            .and_then(|c| c.page_info.end_cursor.clone());
        let page = self
            .client
            .data
            .fetch_replies(RepliesQuery {
                comment_id: self.comment,
                first: size,
                after,
                order_by: self.client.config.order_by,
                selection: self.selection.clone(),
            })
            .await?;
        tracing::debug!(
            comment = ?self.comment,
            edges = page.edges.len(),
            has_next_page = page.page_info.has_next_page,
            "loaded more replies"
        );
        self.client.store.lock().apply_page(page, true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{Error as ApiError, ReplySort},
        testing::{settle, Harness},
    };

    fn vars(ancestor_id: CommentId) -> ReplyCreatedVariables {
        ReplyCreatedVariables {
            ancestor_id,
            live_direct_replies_insertion: true,
        }
    }

    #[tokio::test]
    async fn connection_pages_until_exhausted() {
        let h = Harness::new(ClientConfig::default());
        let (top, replies) = h.thread(5).await;
        h.client
            .fetch_replies(top.id, PageSize::First(2), Selection::default())
            .await
            .unwrap();
        let conn = h.client.connection(top.id, Selection::default());
        assert!(conn.has_more());
        conn.load_more(PageSize::First(2)).await.unwrap();
        assert!(conn.has_more());
        conn.load_more(PageSize::Remaining).await.unwrap();
        assert!(!conn.has_more());

        let snapshot = h.client.snapshot();
        let edges = &snapshot.connection(&top.id).unwrap().edges;
        assert_eq!(
            edges.iter().map(|e| e.node).collect::<Vec<_>>(),
            replies.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn descending_order_is_forwarded() {
        let h = Harness::new(ClientConfig {
            order_by: ReplySort::CreatedAtDesc,
            ..ClientConfig::default()
        });
        let (top, replies) = h.thread(3).await;
        h.client
            .fetch_replies(top.id, PageSize::First(1), Selection::default())
            .await
            .unwrap();
        let snapshot = h.client.snapshot();
        assert_eq!(snapshot.connection(&top.id).unwrap().edges[0].node, replies[2].id);
    }

    #[tokio::test]
    async fn disposed_subscription_stops_applying() {
        let h = Harness::new(ClientConfig::default());
        let (top, _) = h.thread(0).await;
        h.client
            .fetch_replies(top.id, PageSize::First(3), Selection::default())
            .await
            .unwrap();
        let mut sub = h.client.subscribe_reply_created(vars(top.id));
        settle().await;
        h.server.post(Some(top.id), "first").await.unwrap();
        settle().await;
        assert_eq!(h.client.snapshot().connection(&top.id).unwrap().edges.len(), 1);

        assert!(sub.dispose());
        settle().await;
        h.server.post(Some(top.id), "second").await.unwrap();
        settle().await;
        assert_eq!(h.client.snapshot().connection(&top.id).unwrap().edges.len(), 1);
        assert_eq!(h.server.test_open_feeds(), 0);
    }

    #[tokio::test]
    async fn failed_subscription_is_forgotten() {
        let h = Harness::new(ClientConfig::default());
        let (top, _) = h.thread(0).await;
        h.server
            .test_fail_next(ApiError::PermissionDenied);
        let sub = h.client.subscribe_reply_created(vars(top.id));
        assert_eq!(h.client.active_subscriptions().len(), 1);
        settle().await;
        assert!(h.client.active_subscriptions().is_empty());
        drop(sub);
    }

    #[tokio::test]
    async fn fetch_errors_are_typed() {
        let h = Harness::new(ClientConfig::default());
        let missing = CommentId::stub();
        let err = h
            .client
            .fetch_replies(missing, PageSize::First(3), Selection::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::CommentNotFound(id)) if id == missing));
        assert_eq!(err.code(), "COMMENT_NOT_FOUND");
    }
}
