//! Notification engine: routes inbound actions to the sequencer and the gate,
//! and turns every result into something the user sees.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use herald_types::config::DestinationSet;
use herald_types::error::{ErrorKind, WorkflowError};
use herald_types::prompt::{InboundAction, Outcome, Prompt};
use herald_types::workflow::Initiator;

use crate::adapter::{ChannelDirectory, DeliveryTransport, Interaction};
use crate::dispatch::Dispatcher;
use crate::workflow::gate::ConfirmationGate;
use crate::workflow::sequencer::Sequencer;
use crate::workflow::store::WorkflowStore;

pub struct NotificationEngine<T: DeliveryTransport, D: ChannelDirectory> {
    store: Arc<WorkflowStore>,
    sequencer: Sequencer<D>,
    gate: ConfirmationGate<T, D>,
}

impl<T: DeliveryTransport, D: ChannelDirectory> NotificationEngine<T, D> {
    pub fn new(
        store: Arc<WorkflowStore>,
        transport: Arc<T>,
        directory: Arc<D>,
        destinations: DestinationSet,
    ) -> Self {
        let destinations = Arc::new(destinations);
        let sequencer = Sequencer::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&destinations),
        );
        let gate = ConfirmationGate::new(
            Arc::clone(&store),
            directory,
            Dispatcher::new(transport, destinations),
        );
        Self {
            store,
            sequencer,
            gate,
        }
    }

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    pub fn sequencer(&self) -> &Sequencer<D> {
        &self.sequencer
    }

    /// Advance the workflow for one action and return the next prompt.
    pub async fn process(
        &self,
        action: InboundAction,
        initiator: &Initiator,
        origin: Option<&str>,
    ) -> Result<Prompt, WorkflowError> {
        match action {
            InboundAction::Begin => Ok(Prompt::ChooseCategory(self.sequencer.categories())),
            InboundAction::PickCategory { category } => {
                let prompt = self
                    .sequencer
                    .start(category, initiator.clone(), origin.map(str::to_string))
                    .await?;
                Ok(Prompt::ChooseDestinations(prompt))
            }
            InboundAction::PickDestinations { key, values } => {
                let prompt = self.sequencer.select_destinations(&key, &values)?;
                Ok(Prompt::EnterContent(prompt))
            }
            InboundAction::SubmitContent {
                key,
                message,
                details,
            } => {
                let instance = self.sequencer.submit_content(&key, message, details)?;
                let preview = self.gate.preview(&instance).await?;
                Ok(Prompt::Confirm(preview))
            }
            InboundAction::Confirm { key } => {
                let outcome = self.gate.confirm(&key).await?;
                if let Outcome::Delivered { report } = &outcome {
                    info!(
                        %key,
                        attempted = report.attempted(),
                        delivered = report.delivered(),
                        "notification confirmed"
                    );
                }
                Ok(Prompt::Finished(outcome))
            }
            InboundAction::Cancel { key } => Ok(Prompt::Finished(self.gate.cancel(&key))),
        }
    }

    /// Process an action on behalf of `interaction` and render the result.
    ///
    /// Errors become prompts here: expiry finishes the workflow with a
    /// restart hint, validation rejects the step so it can be retried, and
    /// adapter faults finish with a generic retryable message. Returns the
    /// prompt that was rendered (or attempted).
    pub async fn handle<I: Interaction>(&self, interaction: &I, action: InboundAction) -> Prompt {
        let name = action.name();
        let prompt = match self
            .process(action, interaction.initiator(), interaction.origin())
            .await
        {
            Ok(prompt) => prompt,
            Err(err) => {
                debug!(action = name, error = %err, "action failed");
                error_prompt(&err)
            }
        };

        let rendered = match &prompt {
            Prompt::Confirm(preview) => interaction.request_confirmation(preview.clone()).await,
            other => interaction.respond(other.clone()).await,
        };

        if let Err(err) = rendered {
            warn!(action = name, error = %err, "failed to render prompt, reporting generic error");
            let fallback = error_prompt(&err);
            if let Err(err) = interaction.respond(fallback).await {
                error!(action = name, error = %err, "failed to report error to user");
            }
        }

        prompt
    }
}

/// The user-facing prompt for a failed action.
pub fn error_prompt(err: &WorkflowError) -> Prompt {
    let message = err.user_message();
    match err.kind() {
        ErrorKind::ExpiredOrUnknown => Prompt::Finished(Outcome::Expired { message }),
        ErrorKind::ValidationFailed => Prompt::Rejected {
            kind: ErrorKind::ValidationFailed,
            message,
        },
        ErrorKind::AdapterFault | ErrorKind::DestinationDeliveryFailed => {
            Prompt::Finished(Outcome::Failed { message })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
