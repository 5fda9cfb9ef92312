use std::path::Path;

use anyhow::Context;

use coral_api::{Comment, Settings, Story, Viewer};

/// Stream contents a mock server can be seeded with
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct Fixture {
    pub story: Story,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub viewer: Option<Viewer>,

    /// Top-level comments and replies, in any order
    pub comments: Vec<Comment>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Fixture> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading fixture {path:?}"))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing fixture {path:?}"))
    }
}
