use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod comment;
pub use comment::{Comment, CommentId, CommentStatus, Cursor, ReplyEdge, ViewerAction};

mod data_layer;
pub use data_layer::{DataLayer, ReplyFeed};

mod error;
pub use error::Error;

mod event;
pub use event::{FeedMessage, ReplyCreatedVariables};

mod query;
pub use query::{
    ConnectionSelection, PageInfo, PageSize, RepliesPage, RepliesQuery, ReplySort, Selection,
};

mod story;
pub use story::{DisableCommenting, LiveSettings, Settings, Story, StoryId, StorySettings};

mod user;
pub use user::{UserId, Viewer};

// The data layer refuses strings containing null bytes
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}
