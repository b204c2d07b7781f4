//! POST /api/v1/interactions - advance a notification workflow by one action.
//!
//! A platform gateway forwards each user action (slash command, select menu
//! submission, modal submission, button press) together with the acting
//! user. The response carries the prompt the gateway must render next.

use std::sync::Mutex;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use herald_core::adapter::Interaction;
use herald_core::workflow::engine::error_prompt;
use herald_types::error::WorkflowError;
use herald_types::notification::Category;
use herald_types::prompt::{InboundAction, Prompt};
use herald_types::workflow::{Initiator, WorkflowKey};

use crate::http::error::AppError;
use crate::http::response::{Envelope, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub initiator: Initiator,
    #[serde(default)]
    pub origin: Option<String>,
    pub action: ActionPayload,
}

/// An inbound action as it arrives on the wire, with its workflow key still
/// unparsed. A key that does not parse names no live workflow, so it is
/// reported as expired rather than as a malformed request.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionPayload {
    Begin,
    PickCategory {
        category: Category,
    },
    PickDestinations {
        key: String,
        values: Vec<String>,
    },
    SubmitContent {
        key: String,
        message: String,
        #[serde(default)]
        details: Option<String>,
    },
    Confirm {
        key: String,
    },
    Cancel {
        key: String,
    },
}

impl ActionPayload {
    fn into_action(self) -> Result<InboundAction, WorkflowError> {
        Ok(match self {
            ActionPayload::Begin => InboundAction::Begin,
            ActionPayload::PickCategory { category } => InboundAction::PickCategory { category },
            ActionPayload::PickDestinations { key, values } => InboundAction::PickDestinations {
                key: parse_key(key)?,
                values,
            },
            ActionPayload::SubmitContent {
                key,
                message,
                details,
            } => InboundAction::SubmitContent {
                key: parse_key(key)?,
                message,
                details,
            },
            ActionPayload::Confirm { key } => InboundAction::Confirm { key: parse_key(key)? },
            ActionPayload::Cancel { key } => InboundAction::Cancel { key: parse_key(key)? },
        })
    }
}

fn parse_key(raw: String) -> Result<WorkflowKey, WorkflowError> {
    raw.parse().map_err(|reason: String| {
        tracing::debug!(key = %raw, %reason, "unparseable workflow key");
        WorkflowError::ExpiredOrUnknown(raw)
    })
}

/// An interaction whose rendering is the HTTP response body.
struct HttpInteraction {
    initiator: Initiator,
    origin: Option<String>,
    rendered: Mutex<Option<Prompt>>,
}

impl HttpInteraction {
    fn new(initiator: Initiator, origin: Option<String>) -> Self {
        Self {
            initiator,
            origin,
            rendered: Mutex::new(None),
        }
    }

    fn into_rendered(self) -> Option<Prompt> {
        self.rendered.into_inner().ok().flatten()
    }
}

impl Interaction for HttpInteraction {
    fn initiator(&self) -> &Initiator {
        &self.initiator
    }

    fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    async fn respond(&self, prompt: Prompt) -> Result<(), WorkflowError> {
        let mut slot = self
            .rendered
            .lock()
            .map_err(|_| WorkflowError::Adapter("response slot poisoned".to_string()))?;
        *slot = Some(prompt);
        Ok(())
    }
}

/// Only the user who started a workflow may continue it.
///
/// Unknown or expired keys pass through so the engine reports them the usual
/// way.
fn authorize(state: &AppState, action: &InboundAction, initiator: &Initiator) -> Result<(), AppError> {
    let Some(key) = action.key() else {
        return Ok(());
    };
    match state.store.get(key) {
        Ok(instance) if instance.initiator.id != initiator.id => {
            tracing::warn!(
                %key,
                owner = %instance.initiator.id,
                caller = %initiator.id,
                action = action.name(),
                "rejected action on another user's workflow"
            );
            Err(AppError::Forbidden(
                "Only the user who started this notification can continue it.".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

pub async fn handle_interaction(
    State(state): State<AppState>,
    payload: Result<Json<InteractionRequest>, JsonRejection>,
) -> Result<Json<Envelope<Prompt>>, AppError> {
    let timer = RequestTimer::start();
    let Json(request) = payload?;

    if request.initiator.id.trim().is_empty() {
        return Err(AppError::Validation("initiator.id must not be empty".to_string()));
    }
    let action = match request.action.into_action() {
        Ok(action) => action,
        Err(err) => {
            return Ok(Json(
                Envelope::ok(error_prompt(&err), &timer).link("self", "/api/v1/interactions"),
            ));
        }
    };
    authorize(&state, &action, &request.initiator)?;

    let interaction = HttpInteraction::new(request.initiator, request.origin);
    let produced = state.engine.handle(&interaction, action).await;
    let prompt = interaction.into_rendered().unwrap_or(produced);

    Ok(Json(
        Envelope::ok(prompt, &timer).link("self", "/api/v1/interactions"),
    ))
}
