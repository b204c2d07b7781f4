//! Dry-run platform used when no bot token is configured.
//!
//! Every configured channel is reported as an existing text channel named
//! after its id, and deliveries are logged instead of sent.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use herald_core::adapter::{ChannelDirectory, ChannelInfo, DeliveryTransport};
use herald_types::config::DestinationSet;
use herald_types::error::DeliveryError;
use herald_types::notification::Notice;
use herald_types::workflow::{ChannelId, RecipientId};

#[derive(Debug)]
pub struct DryRunPlatform {
    known: HashSet<ChannelId>,
    deliveries: AtomicUsize,
}

impl DryRunPlatform {
    pub fn new(destinations: &DestinationSet) -> Self {
        Self {
            known: destinations.channels.iter().cloned().collect(),
            deliveries: AtomicUsize::new(0),
        }
    }

    /// Number of deliveries logged so far.
    pub fn deliveries(&self) -> usize {
        self.deliveries.load(Ordering::Relaxed)
    }
}

impl ChannelDirectory for DryRunPlatform {
    async fn lookup(&self, channel: &ChannelId) -> Result<Option<ChannelInfo>, DeliveryError> {
        Ok(self.known.contains(channel).then(|| ChannelInfo {
            id: channel.clone(),
            name: channel.to_string(),
            text_capable: true,
        }))
    }
}

impl DeliveryTransport for DryRunPlatform {
    async fn send_to_channel(&self, channel: &ChannelId, notice: &Notice) -> Result<(), DeliveryError> {
        if !self.known.contains(channel) {
            return Err(DeliveryError::Unreachable(channel.to_string()));
        }
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            channel = %channel,
            headline = %notice.headline(),
            message = %notice.message,
            "[dry run] would post notification"
        );
        Ok(())
    }

    async fn send_direct(&self, recipient: &RecipientId, notice: &Notice) -> Result<(), DeliveryError> {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            recipient = %recipient,
            title = notice.title(),
            "[dry run] would send direct notification"
        );
        Ok(())
    }
}
