//! Notification categories and the finalized notice handed to delivery.
//!
//! A category is a closed set of notification classes. Each one carries a
//! fixed display profile: title, embed color, urgency marker, and the
//! placeholder shown in the content entry prompt.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::Initiator;

/// The predefined notification classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Boss,
    Team,
    General,
    Urgent,
}

impl Category {
    /// All categories in the order they are offered to the user.
    pub const ALL: [Category; 4] = [
        Category::Boss,
        Category::Team,
        Category::General,
        Category::Urgent,
    ];

    /// Stable wire identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Category::Boss => "boss",
            Category::Team => "team",
            Category::General => "general",
            Category::Urgent => "urgent",
        }
    }

    pub fn profile(&self) -> &'static CategoryProfile {
        match self {
            Category::Boss => &BOSS,
            Category::Team => &TEAM,
            Category::General => &GENERAL,
            Category::Urgent => &URGENT,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Accepts the bare id (`urgent`) and the legacy button id (`type_urgent`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        let id = id.strip_prefix("type_").unwrap_or(id);
        Category::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(id))
            .ok_or_else(|| format!("unknown notification category '{s}'"))
    }
}

/// How loudly a notice pings the destination channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// Pings members currently online.
    Here,
    /// Pings every member.
    Everyone,
}

impl AlertLevel {
    pub fn mention(&self) -> &'static str {
        match self {
            AlertLevel::Here => "@here",
            AlertLevel::Everyone => "@everyone",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mention())
    }
}

/// Fixed display attributes of a category.
#[derive(Debug, PartialEq, Eq)]
pub struct CategoryProfile {
    pub emoji: &'static str,
    /// Title including the emoji, e.g. "🚨 Urgent".
    pub title: &'static str,
    /// RGB color as `0xRRGGBB`.
    pub color: u32,
    pub alert: AlertLevel,
    pub placeholder: &'static str,
}

static BOSS: CategoryProfile = CategoryProfile {
    emoji: "🐉",
    title: "🐉 Field Boss",
    color: 0xFF0000,
    alert: AlertLevel::Here,
    placeholder: "e.g. The zombie mushroom boss just spawned!",
};

static TEAM: CategoryProfile = CategoryProfile {
    emoji: "🎮",
    title: "🎮 Party Up",
    color: 0x00FF00,
    alert: AlertLevel::Here,
    placeholder: "e.g. Party for room 101 needs a healer and a mage",
};

static GENERAL: CategoryProfile = CategoryProfile {
    emoji: "📝",
    title: "📝 General",
    color: 0xFFA500,
    alert: AlertLevel::Here,
    placeholder: "e.g. Event tonight, don't forget to join!",
};

static URGENT: CategoryProfile = CategoryProfile {
    emoji: "🚨",
    title: "🚨 Urgent",
    color: 0xFF1493,
    alert: AlertLevel::Everyone,
    placeholder: "e.g. Everyone assemble right now!",
};

/// A fully assembled notification, identical for every destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub category: Category,
    /// Primary content.
    pub message: String,
    /// Optional secondary content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub sender: Initiator,
    /// Name of the community the workflow was started from, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        self.category.profile().title
    }

    /// Plain-text line accompanying a broadcast, e.g. "@everyone 🚨 Urgent".
    pub fn headline(&self) -> String {
        let profile = self.category.profile();
        format!("{} {}", profile.alert.mention(), profile.title)
    }
}
