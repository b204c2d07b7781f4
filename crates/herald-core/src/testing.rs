//! Recording fakes for the adapter ports, shared by the core's unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use herald_types::error::{DeliveryError, WorkflowError};
use herald_types::notification::{Category, Notice};
use herald_types::prompt::Prompt;
use herald_types::workflow::{ChannelId, Initiator, RecipientId};

use crate::adapter::{ChannelDirectory, ChannelInfo, DeliveryTransport, Interaction};

// ---------------------------------------------------------------------------
// FakePlatform
// ---------------------------------------------------------------------------

/// One recorded delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub target: String,
    pub direct: bool,
    pub category: Category,
    pub headline: String,
    pub message: String,
    pub succeeded: bool,
}

/// In-memory channel directory and transport.
#[derive(Default)]
pub struct FakePlatform {
    channels: Mutex<HashMap<ChannelId, ChannelInfo>>,
    failing: Mutex<HashSet<String>>,
    attempts: Mutex<Vec<Attempt>>,
    unreadable: Mutex<HashSet<ChannelId>>,
    delays: Mutex<HashMap<String, Duration>>,
    directory_down: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform where every id in `ids` is a text channel named `chan-<id>`.
    pub fn with_text_channels(ids: &[&str]) -> Self {
        let platform = Self::new();
        for id in ids {
            platform.add_channel(id, &format!("chan-{id}"), true);
        }
        platform
    }

    pub fn add_channel(&self, id: &str, name: &str, text_capable: bool) {
        let id = ChannelId::new(id);
        self.channels.lock().unwrap().insert(
            id.clone(),
            ChannelInfo {
                id,
                name: name.to_string(),
                text_capable,
            },
        );
    }

    /// Make every delivery to `target` fail.
    pub fn fail_target(&self, target: &str) {
        self.failing.lock().unwrap().insert(target.to_string());
    }

    /// Make every directory lookup fail.
    pub fn take_directory_down(&self) {
        self.directory_down.store(true, Ordering::SeqCst);
    }

    /// Make lookups of `id` fail as if the bot could not view the channel.
    pub fn deny_lookup(&self, id: &str) {
        self.unreadable.lock().unwrap().insert(ChannelId::new(id));
    }

    /// Hold every lookup of and delivery to `target` for `delay`.
    pub fn delay_target(&self, target: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(target.to_string(), delay);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn channel_attempts(&self) -> Vec<Attempt> {
        self.attempts().into_iter().filter(|a| !a.direct).collect()
    }

    pub fn direct_attempts(&self) -> Vec<Attempt> {
        self.attempts().into_iter().filter(|a| a.direct).collect()
    }

    async fn stall(&self, target: &str) {
        let delay = self.delays.lock().unwrap().get(target).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn record(&self, target: &str, direct: bool, notice: &Notice) -> Result<(), DeliveryError> {
        self.stall(target).await;
        let succeeded = !self.failing.lock().unwrap().contains(target);
        self.attempts.lock().unwrap().push(Attempt {
            target: target.to_string(),
            direct,
            category: notice.category,
            headline: notice.headline(),
            message: notice.message.clone(),
            succeeded,
        });
        if succeeded {
            Ok(())
        } else {
            Err(DeliveryError::Unreachable(target.to_string()))
        }
    }
}

impl ChannelDirectory for FakePlatform {
    async fn lookup(&self, channel: &ChannelId) -> Result<Option<ChannelInfo>, DeliveryError> {
        self.stall(channel.as_str()).await;
        if self.directory_down.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("directory offline".to_string()));
        }
        if self.unreadable.lock().unwrap().contains(channel) {
            return Err(DeliveryError::Unauthorized(channel.to_string()));
        }
        Ok(self.channels.lock().unwrap().get(channel).cloned())
    }
}

impl DeliveryTransport for FakePlatform {
    async fn send_to_channel(
        &self,
        channel: &ChannelId,
        notice: &Notice,
    ) -> Result<(), DeliveryError> {
        self.record(channel.as_str(), false, notice).await
    }

    async fn send_direct(
        &self,
        recipient: &RecipientId,
        notice: &Notice,
    ) -> Result<(), DeliveryError> {
        self.record(recipient.as_str(), true, notice).await
    }
}

// ---------------------------------------------------------------------------
// RecordingInteraction
// ---------------------------------------------------------------------------

/// An interaction that keeps every prompt it was asked to render.
pub struct RecordingInteraction {
    initiator: Initiator,
    prompts: Mutex<Vec<Prompt>>,
    confirmations: Mutex<usize>,
    /// Number of upcoming `respond` calls that should fail.
    failures_left: Mutex<usize>,
}

impl RecordingInteraction {
    pub fn new(initiator: Initiator) -> Self {
        Self {
            initiator,
            prompts: Mutex::new(Vec::new()),
            confirmations: Mutex::new(0),
            failures_left: Mutex::new(0),
        }
    }

    pub fn failing(initiator: Initiator, failures: usize) -> Self {
        let interaction = Self::new(initiator);
        *interaction.failures_left.lock().unwrap() = failures;
        interaction
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> usize {
        *self.confirmations.lock().unwrap()
    }
}

impl Interaction for RecordingInteraction {
    fn initiator(&self) -> &Initiator {
        &self.initiator
    }

    fn origin(&self) -> Option<&str> {
        Some("Test Guild")
    }

    async fn respond(&self, prompt: Prompt) -> Result<(), WorkflowError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(WorkflowError::Adapter("render failed".to_string()));
            }
        }
        self.prompts.lock().unwrap().push(prompt);
        Ok(())
    }

    async fn request_confirmation(
        &self,
        preview: herald_types::prompt::Preview,
    ) -> Result<(), WorkflowError> {
        *self.confirmations.lock().unwrap() += 1;
        self.respond(Prompt::Confirm(preview)).await
    }
}
