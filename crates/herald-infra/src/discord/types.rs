//! Discord REST API request and response types.
//!
//! Only the fields Herald reads or writes are modelled; unknown fields in
//! responses are ignored.

use serde::{Deserialize, Serialize};

/// Channel types that accept text messages: guild text, DM, voice (text
/// chat), group DM, announcement, and the three thread types.
pub const TEXT_CHANNEL_TYPES: [u8; 8] = [0, 1, 2, 3, 5, 10, 11, 12];

/// `GET /channels/{id}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl DiscordChannel {
    pub fn is_text_based(&self) -> bool {
        TEXT_CHANNEL_TYPES.contains(&self.kind)
    }
}

/// `POST /channels/{id}/messages` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    pub footer: EmbedFooter,
    /// ISO 8601 timestamp shown in the embed footer.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// `POST /users/@me/channels` body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDm<'a> {
    pub recipient_id: &'a str,
}

/// A created message or DM channel; only the id is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    pub id: String,
}

/// `GET /users/@me` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BotUser {
    pub id: String,
    pub username: String,
}

/// Slash command definition sent on registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    /// 1 = chat input (slash) command.
    #[serde(rename = "type")]
    pub kind: u8,
}

/// A registered application command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}
