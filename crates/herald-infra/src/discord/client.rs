//! DiscordClient -- [`ChannelDirectory`] and [`DeliveryTransport`] over the
//! Discord REST API (v10).
//!
//! The bot token is wrapped in [`secrecy::SecretString`] and only exposed
//! when building the `Authorization` header.

use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use herald_core::adapter::{ChannelDirectory, ChannelInfo, DeliveryTransport};
use herald_types::config::DiscordSettings;
use herald_types::error::DeliveryError;
use herald_types::notification::Notice;
use herald_types::workflow::{ChannelId, RecipientId};

use super::render;
use super::types::{BotUser, CreateDm, CreateMessage, Created, DiscordChannel};

/// Discord REST client.
///
/// Does not derive Debug so the token never reaches a log line.
pub struct DiscordClient {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl DiscordClient {
    pub fn new(token: SecretString, settings: &DiscordSettings) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Override the base URL (tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send an authenticated request and fail on any non-success status.
    ///
    /// `target` names the channel or user the request is about, for errors.
    pub(crate) async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        target: &str,
        body: Option<&B>,
    ) -> Result<Response, DeliveryError> {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(
                "Authorization",
                format!("Bot {}", self.token.expose_secret()),
            );
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("request to {target} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_body = response.text().await.unwrap_or_default();
        Err(status_error(status, target, &error_body))
    }

    pub(crate) async fn request_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        target: &str,
        body: Option<&B>,
    ) -> Result<T, DeliveryError> {
        self.request(method, path, target, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| DeliveryError::Transport(format!("unexpected response for {target}: {e}")))
    }

    /// Fetch a channel. `Ok(None)` when Discord reports it unknown.
    pub async fn get_channel(&self, id: &str) -> Result<Option<DiscordChannel>, DeliveryError> {
        let path = format!("/channels/{id}");
        match self
            .request_json::<DiscordChannel, ()>(Method::GET, &path, id, None)
            .await
        {
            Ok(channel) => Ok(Some(channel)),
            Err(DeliveryError::Unreachable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The bot account the token belongs to.
    pub async fn current_user(&self) -> Result<BotUser, DeliveryError> {
        self.request_json::<BotUser, ()>(Method::GET, "/users/@me", "@me", None)
            .await
    }

    async fn post_message(&self, channel_id: &str, message: &CreateMessage) -> Result<(), DeliveryError> {
        let path = format!("/channels/{channel_id}/messages");
        let created: Created = self
            .request_json(Method::POST, &path, channel_id, Some(message))
            .await?;
        tracing::debug!(channel = channel_id, message_id = %created.id, "message posted");
        Ok(())
    }

    async fn open_dm(&self, recipient_id: &str) -> Result<String, DeliveryError> {
        let body = CreateDm { recipient_id };
        let channel: Created = self
            .request_json(Method::POST, "/users/@me/channels", recipient_id, Some(&body))
            .await?;
        Ok(channel.id)
    }
}

/// Map a failed response status to a delivery error.
fn status_error(status: StatusCode, target: &str, body: &str) -> DeliveryError {
    match status {
        StatusCode::NOT_FOUND => DeliveryError::Unreachable(target.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DeliveryError::Unauthorized(target.to_string())
        }
        _ => DeliveryError::Transport(format!("HTTP {status} for {target}: {body}")),
    }
}

impl ChannelDirectory for DiscordClient {
    async fn lookup(&self, channel: &ChannelId) -> Result<Option<ChannelInfo>, DeliveryError> {
        let found = self.get_channel(channel.as_str()).await?;
        Ok(found.map(|c| ChannelInfo {
            text_capable: c.is_text_based(),
            name: c.name.unwrap_or_else(|| c.id.clone()),
            id: ChannelId::new(c.id),
        }))
    }
}

impl DeliveryTransport for DiscordClient {
    async fn send_to_channel(&self, channel: &ChannelId, notice: &Notice) -> Result<(), DeliveryError> {
        let info = self
            .get_channel(channel.as_str())
            .await?
            .ok_or_else(|| DeliveryError::Unreachable(channel.to_string()))?;
        if !info.is_text_based() {
            return Err(DeliveryError::NotTextCapable(channel.to_string()));
        }

        self.post_message(channel.as_str(), &render::channel_message(notice))
            .await?;
        tracing::info!(
            channel = %channel,
            name = info.name.as_deref().unwrap_or_default(),
            "notification sent to channel"
        );
        Ok(())
    }

    async fn send_direct(&self, recipient: &RecipientId, notice: &Notice) -> Result<(), DeliveryError> {
        let dm_channel = self.open_dm(recipient.as_str()).await?;
        self.post_message(&dm_channel, &render::direct_message(notice))
            .await?;
        tracing::info!(recipient = %recipient, "direct notification sent");
        Ok(())
    }
}
