//! Inbound actions and outbound prompts: the contract between the workflow
//! core and whatever adapter renders it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::notification::{AlertLevel, Category};
use crate::workflow::{DestinationChoice, Initiator, WorkflowKey};

/// A user action received from an adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundAction {
    /// The external trigger (slash command or text command).
    Begin,
    PickCategory {
        category: Category,
    },
    PickDestinations {
        key: WorkflowKey,
        values: Vec<String>,
    },
    SubmitContent {
        key: WorkflowKey,
        message: String,
        #[serde(default)]
        details: Option<String>,
    },
    Confirm {
        key: WorkflowKey,
    },
    Cancel {
        key: WorkflowKey,
    },
}

impl InboundAction {
    /// Short action name for logs and transition errors.
    pub fn name(&self) -> &'static str {
        match self {
            InboundAction::Begin => "begin",
            InboundAction::PickCategory { .. } => "pick_category",
            InboundAction::PickDestinations { .. } => "pick_destinations",
            InboundAction::SubmitContent { .. } => "submit_content",
            InboundAction::Confirm { .. } => "confirm",
            InboundAction::Cancel { .. } => "cancel",
        }
    }

    /// The workflow this action continues, if any.
    pub fn key(&self) -> Option<&WorkflowKey> {
        match self {
            InboundAction::Begin | InboundAction::PickCategory { .. } => None,
            InboundAction::PickDestinations { key, .. }
            | InboundAction::SubmitContent { key, .. }
            | InboundAction::Confirm { key }
            | InboundAction::Cancel { key } => Some(key),
        }
    }
}

/// Something the adapter must render for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    ChooseCategory(CategoryPrompt),
    ChooseDestinations(DestinationPrompt),
    EnterContent(ContentPrompt),
    Confirm(Preview),
    /// The last action was refused; the user may retry the same step.
    Rejected { kind: ErrorKind, message: String },
    Finished(Outcome),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrompt {
    pub options: Vec<CategoryOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOption {
    pub category: Category,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationPrompt {
    pub key: WorkflowKey,
    pub category: Category,
    pub title: String,
    pub options: Vec<DestinationOption>,
    pub min_choices: usize,
    pub max_choices: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationOption {
    pub choice: DestinationChoice,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPrompt {
    pub key: WorkflowKey,
    pub category: Category,
    pub title: String,
    pub placeholder: String,
    pub message_max_chars: usize,
    pub details_max_chars: usize,
}

/// Read-only rendering of a fully assembled workflow awaiting confirm/cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub key: WorkflowKey,
    pub category: Category,
    pub title: String,
    /// Embedded so an enforcement layer can compare it with whoever confirms.
    pub initiator: Initiator,
    pub alert: AlertLevel,
    /// Display line per selected destination.
    pub destinations: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Terminal result of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Delivered { report: DispatchReport },
    Cancelled,
    Expired { message: String },
    Failed { message: String },
}

/// Aggregate result of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub channels: PassReport,
    pub direct: PassReport,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.channels.attempted + self.direct.attempted
    }

    pub fn delivered(&self) -> usize {
        self.channels.delivered + self.direct.delivered
    }

    pub fn is_complete(&self) -> bool {
        self.channels.failed.is_empty() && self.direct.failed.is_empty()
    }
}

/// Result of one delivery pass (broadcast or direct).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub attempted: usize,
    pub delivered: usize,
    /// Ids of targets whose delivery failed.
    pub failed: Vec<String>,
}
