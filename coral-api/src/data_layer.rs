use async_trait::async_trait;
use futures::channel::mpsc;

use crate::{CommentId, Error, FeedMessage, RepliesPage, RepliesQuery, ReplyCreatedVariables};

/// Receiving end of a live subscription; dropping it ends the subscription
pub type ReplyFeed = mpsc::UnboundedReceiver<FeedMessage>;

/// Query, mutation and subscription endpoint the client is built upon
#[async_trait]
pub trait DataLayer: Send + Sync {
    async fn fetch_replies(&self, query: RepliesQuery) -> Result<RepliesPage, Error>;

    /// Mark every view-new reply of `comment` as seen by the viewer
    async fn view_new_replies(&self, comment: CommentId) -> Result<(), Error>;

    async fn subscribe_reply_created(&self, vars: ReplyCreatedVariables)
        -> Result<ReplyFeed, Error>;
}
