mod client;
pub use client::{Client, Connection};

mod composer;
pub use composer::{ReplyList, Thread, ThreadComposer};

mod config;
pub use config::ClientConfig;

mod controller;
pub use controller::{ReplyListController, ReplyListProps};

mod error;
pub use error::Error;

pub mod events;
pub use events::{EventSink, TracingSink, ViewerNetworkEvent};

pub mod level;
pub use level::{Level, LevelSpec, ReplySource, LEVELS, TERMINAL_DEPTH};

mod local;
pub use local::LocalReplyList;

mod store;
pub use store::{EdgeRef, Insertion, ParkedReply, ReplyConnection, Store};

mod subscription;
pub use subscription::Subscription;

#[cfg(test)]
mod testing;

mod view;
pub use view::{RenderContext, ReplyListElement, ReplyListView, ReplyTree, VisibleReply};

pub mod api {
    pub use coral_api::*;
}
