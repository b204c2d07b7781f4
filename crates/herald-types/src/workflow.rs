//! Workflow instance types.
//!
//! A workflow instance is one user's in-progress path from category choice
//! to confirm, cancel, or expiry. Instances are addressed by a structured
//! [`WorkflowKey`] (category + opaque instance id) rather than a delimited
//! string, so category ids never need to be re-parsed out of a key.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkflowError;
use crate::notification::Category;

/// Lifetime of an unconfirmed workflow instance, measured from creation.
///
/// Shared by store eviction and the confirmation-time freshness check.
pub const WORKFLOW_TTL: Duration = Duration::from_secs(10 * 60);

/// Maximum characters in the primary content.
pub const MESSAGE_MAX_CHARS: usize = 1000;

/// Maximum characters in the optional secondary content.
pub const DETAILS_MAX_CHARS: usize = 500;

/// Upper bound on destination choices in one selection.
pub const MAX_DESTINATION_CHOICES: usize = 10;

/// Wire value of the "all configured channels" choice.
pub const ALL_CHANNELS_VALUE: &str = "all_channels";

/// Wire value of the "no channels configured" choice.
pub const NO_CHANNELS_VALUE: &str = "no_channels";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Opaque per-instance identifier (UUIDv7, time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Structured workflow key: the category plus an opaque instance id.
///
/// Its string form is `"<category>:<instance>"`, used when an adapter must
/// embed the key inside a component id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct WorkflowKey {
    pub category: Category,
    pub instance: InstanceId,
}

impl WorkflowKey {
    pub fn new(category: Category, instance: InstanceId) -> Self {
        Self { category, instance }
    }
}

impl fmt::Display for WorkflowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.instance)
    }
}

impl FromStr for WorkflowKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, instance) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("malformed workflow key '{s}'"))?;
        let category = category.parse::<Category>()?;
        let instance = Uuid::parse_str(instance)
            .map_err(|e| format!("malformed workflow key '{s}': {e}"))?;
        Ok(Self::new(category, InstanceId(instance)))
    }
}

impl From<WorkflowKey> for String {
    fn from(key: WorkflowKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for WorkflowKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Position of an instance in the workflow. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CategorySelected,
    DestinationsSelected,
    ContentEntered,
    AwaitingConfirmation,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::CategorySelected => "category_selected",
            Step::DestinationsSelected => "destinations_selected",
            Step::ContentEntered => "content_entered",
            Step::AwaitingConfirmation => "awaiting_confirmation",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Destinations
// ---------------------------------------------------------------------------

/// Opaque broadcast channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque direct-message recipient identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a destination selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DestinationChoice {
    /// Sentinel: every configured broadcast channel.
    All,
    /// Sentinel: configuration lists no channels.
    NoneConfigured,
    /// A literal channel id, passed through unresolved.
    Channel(ChannelId),
}

impl DestinationChoice {
    /// Parse a selection value as submitted by an adapter.
    pub fn from_value(value: &str) -> Result<Self, String> {
        match value.trim() {
            "" => Err("destination value must not be empty".to_string()),
            ALL_CHANNELS_VALUE => Ok(DestinationChoice::All),
            NO_CHANNELS_VALUE => Ok(DestinationChoice::NoneConfigured),
            id => Ok(DestinationChoice::Channel(ChannelId::new(id))),
        }
    }

    pub fn as_value(&self) -> &str {
        match self {
            DestinationChoice::All => ALL_CHANNELS_VALUE,
            DestinationChoice::NoneConfigured => NO_CHANNELS_VALUE,
            DestinationChoice::Channel(id) => id.as_str(),
        }
    }
}

impl From<DestinationChoice> for String {
    fn from(choice: DestinationChoice) -> Self {
        choice.as_value().to_string()
    }
}

impl TryFrom<String> for DestinationChoice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DestinationChoice::from_value(&value)
    }
}

// ---------------------------------------------------------------------------
// Content and initiator
// ---------------------------------------------------------------------------

/// Validated free-text content of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Content {
    /// Validate and build content.
    ///
    /// The message must hold 1..=1000 characters and not be blank. Details are
    /// optional; blank details count as absent, and at most 500 characters
    /// are accepted.
    pub fn new(message: impl Into<String>, details: Option<String>) -> Result<Self, WorkflowError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(WorkflowError::ValidationFailed(
                "message is required".to_string(),
            ));
        }
        let len = message.chars().count();
        if len > MESSAGE_MAX_CHARS {
            return Err(WorkflowError::ValidationFailed(format!(
                "message is {len} characters, the limit is {MESSAGE_MAX_CHARS}"
            )));
        }

        let details = details.filter(|d| !d.trim().is_empty());
        if let Some(d) = &details {
            let len = d.chars().count();
            if len > DETAILS_MAX_CHARS {
                return Err(WorkflowError::ValidationFailed(format!(
                    "details are {len} characters, the limit is {DETAILS_MAX_CHARS}"
                )));
            }
        }

        Ok(Self { message, details })
    }
}

/// The user who started a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiator {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Initiator {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// Transient state of one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub key: WorkflowKey,
    pub step: Step,
    /// Selected destinations in selection order.
    pub destinations: Vec<DestinationChoice>,
    /// Upper bound on `destinations`, fixed when the destination prompt was built.
    pub max_choices: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    pub initiator: Initiator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(
        key: WorkflowKey,
        initiator: Initiator,
        origin: Option<String>,
        max_choices: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            step: Step::CategorySelected,
            destinations: Vec::new(),
            max_choices,
            content: None,
            initiator,
            origin,
            created_at,
        }
    }

    pub fn category(&self) -> Category {
        self.key.category
    }

    /// Move to `next`, refusing to stay put or go backwards.
    pub fn advance(&mut self, next: Step) -> Result<(), WorkflowError> {
        if next <= self.step {
            return Err(WorkflowError::InvalidTransition {
                step: self.step,
                action: format!("advance to {next}"),
            });
        }
        self.step = next;
        Ok(())
    }
}
