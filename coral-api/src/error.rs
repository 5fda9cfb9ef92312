use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

use crate::CommentId;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Comment not found {0:?}")]
    CommentNotFound(CommentId),

    #[error("Story is closed")]
    StoryClosed,

    #[error("Commenting is disabled")]
    CommentingDisabled,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unknown(_) => "INTERNAL_ERROR",
            Error::Network(_) => "NETWORK_ERROR",
            Error::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Error::StoryClosed => "STORY_CLOSED",
            Error::CommentingDisabled => "COMMENTING_DISABLED",
            Error::PermissionDenied => "NOT_AUTHORIZED",
            Error::NullByteInString(_) => "NULL_BYTE",
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn contents(&self) -> Vec<u8> {
        let code = self.code();
        let message = self.message();
        serde_json::to_vec(&match self {
            Error::CommentNotFound(c) => json!({
                "message": message,
                "code": code,
                "commentID": c.0,
            }),
            Error::Unknown(m) | Error::Network(m) => json!({
                "message": message,
                "code": code,
                "detail": m,
            }),
            Error::NullByteInString(s) => json!({
                "message": message,
                "code": code,
                "string": s,
            }),
            _ => json!({
                "message": message,
                "code": code,
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let detail = || {
            String::from(
                data.get("detail")
                    .or_else(|| data.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or(""),
            )
        };
        Ok(
            match data
                .get("code")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error code is not a string"))?
            {
                "INTERNAL_ERROR" => Error::Unknown(detail()),
                "NETWORK_ERROR" => Error::Network(detail()),
                "COMMENT_NOT_FOUND" => Error::CommentNotFound(CommentId(
                    data.get("commentID")
                        .and_then(|id| id.as_str())
                        .and_then(|id| Uuid::from_str(id).ok())
                        .ok_or_else(|| anyhow!("comment-not-found error without a comment id"))?,
                )),
                "STORY_CLOSED" => Error::StoryClosed,
                "COMMENTING_DISABLED" => Error::CommentingDisabled,
                "NOT_AUTHORIZED" => Error::PermissionDenied,
                "NULL_BYTE" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                _ => return Err(anyhow!("error contents has unknown code")),
            },
        )
    }
}
