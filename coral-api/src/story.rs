use uuid::Uuid;

use crate::STUB_UUID;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct StoryId(pub Uuid);

impl StoryId {
    pub fn stub() -> StoryId {
        StoryId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Story {
    pub id: StoryId,
    pub is_closed: bool,
    pub settings: StorySettings,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StorySettings {
    pub live: LiveSettings,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LiveSettings {
    pub enabled: bool,
}

impl Story {
    pub fn stub() -> Story {
        Story {
            id: StoryId::stub(),
            is_closed: false,
            settings: StorySettings {
                live: LiveSettings { enabled: true },
            },
        }
    }

    pub fn live_enabled(&self) -> bool {
        self.settings.live.enabled
    }
}

/// Tenant-wide settings
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub disable_commenting: DisableCommenting,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DisableCommenting {
    pub enabled: bool,

    /// Shown to users instead of the reply form
    #[serde(default)]
    pub message: Option<String>,
}

impl Settings {
    pub fn commenting_disabled(&self) -> bool {
        self.disable_commenting.enabled
    }
}
