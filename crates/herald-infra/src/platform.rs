//! Platform selection.
//!
//! `PlatformClient` is chosen once at startup: the Discord client when a bot
//! token is available, otherwise the dry-run platform. It implements both
//! delivery ports so the engine is built over one concrete type.

use secrecy::SecretString;

use herald_core::adapter::{ChannelDirectory, ChannelInfo, DeliveryTransport};
use herald_types::config::HeraldConfig;
use herald_types::error::DeliveryError;
use herald_types::notification::Notice;
use herald_types::workflow::{ChannelId, RecipientId};

use crate::discord::DiscordClient;
use crate::dry_run::DryRunPlatform;

pub enum PlatformClient {
    Discord(DiscordClient),
    DryRun(DryRunPlatform),
}

impl PlatformClient {
    pub fn from_config(config: &HeraldConfig, token: Option<SecretString>) -> Result<Self, DeliveryError> {
        match token {
            Some(token) => {
                tracing::debug!(base_url = %config.discord.api_base_url, "using Discord platform");
                Ok(Self::Discord(DiscordClient::new(token, &config.discord)?))
            }
            None => {
                tracing::warn!("DISCORD_BOT_TOKEN not set, running in dry-run mode");
                Ok(Self::DryRun(DryRunPlatform::new(&config.destinations)))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Discord(_) => "discord",
            Self::DryRun(_) => "dry-run",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }

    /// The Discord client, when running against Discord.
    pub fn discord(&self) -> Option<&DiscordClient> {
        match self {
            Self::Discord(client) => Some(client),
            Self::DryRun(_) => None,
        }
    }
}

impl ChannelDirectory for PlatformClient {
    async fn lookup(&self, channel: &ChannelId) -> Result<Option<ChannelInfo>, DeliveryError> {
        match self {
            Self::Discord(client) => client.lookup(channel).await,
            Self::DryRun(dry) => dry.lookup(channel).await,
        }
    }
}

impl DeliveryTransport for PlatformClient {
    async fn send_to_channel(&self, channel: &ChannelId, notice: &Notice) -> Result<(), DeliveryError> {
        match self {
            Self::Discord(client) => client.send_to_channel(channel, notice).await,
            Self::DryRun(dry) => dry.send_to_channel(channel, notice).await,
        }
    }

    async fn send_direct(&self, recipient: &RecipientId, notice: &Notice) -> Result<(), DeliveryError> {
        match self {
            Self::Discord(client) => client.send_direct(recipient, notice).await,
            Self::DryRun(dry) => dry.send_direct(recipient, notice).await,
        }
    }
}
