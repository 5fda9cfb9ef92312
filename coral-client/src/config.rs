use std::path::Path;

use anyhow::Context;

use crate::api::ReplySort;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Number of replies fetched per connection before the viewer asks for more
    pub initial_reply_count: u32,

    pub order_by: ReplySort,

    /// if true, live replies to top-level comments are inserted directly
    /// instead of hiding behind the "view new" control
    pub live_direct_replies_insertion: bool,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            initial_reply_count: 3,
            order_by: ReplySort::CreatedAtAsc,
            live_direct_replies_insertion: false,
        }
    }
}

impl ClientConfig {
    pub fn from_json(s: &str) -> anyhow::Result<ClientConfig> {
        let cfg: ClientConfig = serde_json::from_str(s).context("parsing client config")?;
        if cfg.initial_reply_count == 0 {
            anyhow::bail!("initial_reply_count must be at least 1");
        }
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<ClientConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading client config {path:?}"))?;
        Self::from_json(&contents).with_context(|| format!("loading client config {path:?}"))
    }
}
