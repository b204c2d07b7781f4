//! Adapter ports.
//!
//! The core never talks to a chat platform directly. It looks channels up
//! through [`ChannelDirectory`], delivers through [`DeliveryTransport`], and
//! answers users through an [`Interaction`]. Uses RPITIT (return position
//! `impl Trait` in traits) like every async trait in this workspace.

use std::future::Future;

use herald_types::error::{DeliveryError, WorkflowError};
use herald_types::notification::Notice;
use herald_types::prompt::{Preview, Prompt};
use herald_types::workflow::{ChannelId, Initiator, RecipientId};

/// What the platform knows about a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    pub text_capable: bool,
}

/// Resolves channel ids to platform channels.
pub trait ChannelDirectory: Send + Sync {
    /// Look a channel up. `Ok(None)` means the platform does not know it.
    fn lookup(
        &self,
        channel: &ChannelId,
    ) -> impl Future<Output = Result<Option<ChannelInfo>, DeliveryError>> + Send;
}

/// Delivers a finished notice to one target.
pub trait DeliveryTransport: Send + Sync {
    fn send_to_channel(
        &self,
        channel: &ChannelId,
        notice: &Notice,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    fn send_direct(
        &self,
        recipient: &RecipientId,
        notice: &Notice,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// One user-facing conversation with the workflow.
///
/// Implemented once per trigger surface (a structured platform interaction,
/// or a plain text trigger) so the engine handles both the same way.
pub trait Interaction: Send + Sync {
    /// The user performing the action.
    fn initiator(&self) -> &Initiator;

    /// Name of the community the action came from, if any.
    fn origin(&self) -> Option<&str> {
        None
    }

    /// Acknowledge the action by rendering `prompt` to the user.
    fn respond(&self, prompt: Prompt) -> impl Future<Output = Result<(), WorkflowError>> + Send;

    /// Present a preview that must be confirmed or cancelled.
    fn request_confirmation(
        &self,
        preview: Preview,
    ) -> impl Future<Output = Result<(), WorkflowError>> + Send {
        self.respond(Prompt::Confirm(preview))
    }
}
