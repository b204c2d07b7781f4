use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::Step;

/// Coarse classification of every failure the workflow can report.
///
/// Adapters decide how to surface an error from its kind alone; the variant
/// detail is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The action names a workflow with no live instance.
    ExpiredOrUnknown,
    /// Input outside declared bounds, or an action illegal for the current step.
    ValidationFailed,
    /// A single delivery target failed during fan-out.
    DestinationDeliveryFailed,
    /// The surrounding platform integration failed.
    AdapterFault,
}

/// Errors raised while sequencing a workflow instance.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow '{0}' expired or unknown")]
    ExpiredOrUnknown(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("action '{action}' is not valid while the workflow is at step {step}")]
    InvalidTransition { step: Step, action: String },

    #[error("adapter fault: {0}")]
    Adapter(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::ExpiredOrUnknown(_) => ErrorKind::ExpiredOrUnknown,
            WorkflowError::ValidationFailed(_) | WorkflowError::InvalidTransition { .. } => {
                ErrorKind::ValidationFailed
            }
            WorkflowError::Adapter(_) => ErrorKind::AdapterFault,
        }
    }

    /// Text shown to the user who performed the failing action.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::ExpiredOrUnknown(_) => {
                "This notification has expired or no longer exists. Please start again with /notify."
                    .to_string()
            }
            WorkflowError::ValidationFailed(reason) => format!("Input rejected: {reason}"),
            WorkflowError::InvalidTransition { .. } => {
                "That action is not available at this step.".to_string()
            }
            WorkflowError::Adapter(_) => {
                "Something went wrong while handling your request. Please try again later."
                    .to_string()
            }
        }
    }
}

/// Errors from delivering a notice to one target.
///
/// Contained inside the dispatch fan-out; never fails the confirm action.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("target {0} is unreachable")]
    Unreachable(String),

    #[error("not authorized to deliver to {0}")]
    Unauthorized(String),

    #[error("channel {0} does not accept text messages")]
    NotTextCapable(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::DestinationDeliveryFailed
    }
}
