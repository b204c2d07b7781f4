//! Configuration types for Herald.
//!
//! `HeraldConfig` mirrors `herald.toml`. Every section has defaults so an
//! empty file (or no file) yields a usable configuration; destinations are
//! usually supplied through the environment instead.

use serde::{Deserialize, Serialize};

use crate::workflow::{ChannelId, RecipientId};

/// Top-level configuration. Read once at process start and then immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub destinations: DestinationSet,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub discord: DiscordSettings,
}

/// Where confirmed notifications are delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationSet {
    /// Broadcast channels, in configuration order.
    #[serde(default)]
    pub channels: Vec<ChannelId>,
    /// Users who also receive every notification as a direct message.
    #[serde(default)]
    pub recipients: Vec<RecipientId>,
}

impl DestinationSet {
    pub fn new(channels: Vec<ChannelId>, recipients: Vec<RecipientId>) -> Self {
        Self {
            channels,
            recipients,
        }
    }

    pub fn has_channels(&self) -> bool {
        !self.channels.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// How often expired workflow instances are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_sweep_interval_secs() -> u64 {
    600
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Application id used for slash command registration.
    #[serde(default)]
    pub application_id: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            application_id: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
