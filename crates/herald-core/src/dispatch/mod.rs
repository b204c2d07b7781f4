//! Dispatch fan-out.
//!
//! Resolves a destination selection into concrete channels and delivers one
//! [`Notice`] to each channel and to each configured direct-message
//! recipient. The two passes run concurrently, and so do the targets inside
//! a pass, so one slow target only delays its own send. A failing target is
//! logged and counted; it never aborts the rest of the fan-out and nothing is
//! retried.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use herald_types::config::DestinationSet;
use herald_types::error::DeliveryError;
use herald_types::notification::Notice;
use herald_types::prompt::{DispatchReport, PassReport};
use herald_types::workflow::{ChannelId, DestinationChoice};

use crate::adapter::DeliveryTransport;

/// Expand a selection into the channels to deliver to.
///
/// `All` expands to every configured channel, `NoneConfigured` to nothing,
/// and a literal id to itself (unknown ids are left for the transport to
/// reject). An empty selection falls back to every configured channel.
/// The result keeps first-seen order with duplicates removed.
pub fn resolve(selection: &[DestinationChoice], configured: &DestinationSet) -> Vec<ChannelId> {
    let expanded: Vec<&ChannelId> = if selection.is_empty() {
        configured.channels.iter().collect()
    } else {
        selection
            .iter()
            .flat_map(|choice| match choice {
                DestinationChoice::All => configured.channels.iter().collect::<Vec<_>>(),
                DestinationChoice::NoneConfigured => Vec::new(),
                DestinationChoice::Channel(id) => vec![id],
            })
            .collect()
    };

    let mut seen = HashSet::new();
    expanded
        .into_iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Delivers notices through a [`DeliveryTransport`].
pub struct Dispatcher<T: DeliveryTransport> {
    transport: Arc<T>,
    destinations: Arc<DestinationSet>,
}

impl<T: DeliveryTransport> Dispatcher<T> {
    pub fn new(transport: Arc<T>, destinations: Arc<DestinationSet>) -> Self {
        Self {
            transport,
            destinations,
        }
    }

    pub fn destinations(&self) -> &DestinationSet {
        &self.destinations
    }

    /// Deliver `notice` to the resolved channels and every recipient.
    ///
    /// Always returns once every target has been attempted.
    pub async fn dispatch(&self, selection: &[DestinationChoice], notice: &Notice) -> DispatchReport {
        let channels = resolve(selection, &self.destinations);
        let recipients = &self.destinations.recipients;

        debug!(
            category = %notice.category,
            channels = channels.len(),
            recipients = recipients.len(),
            "dispatching notice"
        );

        let (channels, direct) = tokio::join!(
            run_pass("channel", &channels, |id| self.transport.send_to_channel(id, notice)),
            run_pass("direct", recipients, |id| self.transport.send_direct(id, notice)),
        );

        let report = DispatchReport { channels, direct };
        info!(
            category = %notice.category,
            sender = %notice.sender.display_name,
            attempted = report.attempted(),
            delivered = report.delivered(),
            failed_channels = report.channels.failed.len(),
            failed_direct = report.direct.failed.len(),
            "notice dispatched"
        );
        report
    }
}

async fn run_pass<'a, I, F, Fut>(pass: &'static str, targets: &'a [I], send: F) -> PassReport
where
    I: Display,
    F: Fn(&'a I) -> Fut,
    Fut: Future<Output = Result<(), DeliveryError>>,
{
    let results = join_all(targets.iter().map(|target| {
        let sending = send(target);
        async move { (target, sending.await) }
    }))
    .await;

    let mut report = PassReport {
        attempted: results.len(),
        ..PassReport::default()
    };
    for (target, result) in results {
        match result {
            Ok(()) => {
                report.delivered += 1;
                debug!(pass, target = %target, "delivered");
            }
            Err(e) => {
                warn!(pass, target = %target, kind = ?e.kind(), error = %e, "delivery failed");
                report.failed.push(target.to_string());
            }
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePlatform;
    use chrono::Utc;
    use herald_types::notification::Category;
    use herald_types::workflow::{Initiator, RecipientId};
    use std::time::Duration;

    fn channels(ids: &[&str]) -> Vec<ChannelId> {
        ids.iter().map(|id| ChannelId::new(*id)).collect()
    }

    fn configured(ids: &[&str], recipients: &[&str]) -> DestinationSet {
        DestinationSet::new(
            channels(ids),
            recipients.iter().map(|id| RecipientId::new(*id)).collect(),
        )
    }

    fn notice() -> Notice {
        Notice {
            category: Category::Team,
            message: "Party for room 101".to_string(),
            details: None,
            sender: Initiator::new("1", "mika"),
            origin: Some("Guild".to_string()),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn all_sentinel_resolves_to_every_configured_channel() {
        let config = configured(&["A", "B", "C"], &[]);
        assert_eq!(
            resolve(&[DestinationChoice::All], &config),
            channels(&["A", "B", "C"])
        );
    }

    #[test]
    fn literal_selection_resolves_to_itself() {
        let config = configured(&["A", "B", "C"], &[]);
        let selection = [DestinationChoice::Channel(ChannelId::new("A"))];
        assert_eq!(resolve(&selection, &config), channels(&["A"]));
    }

    #[test]
    fn none_sentinel_resolves_to_nothing() {
        let config = configured(&[], &[]);
        assert!(resolve(&[DestinationChoice::NoneConfigured], &config).is_empty());
    }

    #[test]
    fn unknown_literal_is_passed_through() {
        let config = configured(&["A"], &[]);
        let selection = [DestinationChoice::Channel(ChannelId::new("Z"))];
        assert_eq!(resolve(&selection, &config), channels(&["Z"]));
    }

    #[test]
    fn overlapping_selection_is_deduplicated_in_order() {
        let config = configured(&["A", "B"], &[]);
        let selection = [
            DestinationChoice::Channel(ChannelId::new("B")),
            DestinationChoice::All,
            DestinationChoice::Channel(ChannelId::new("A")),
        ];
        assert_eq!(resolve(&selection, &config), channels(&["B", "A"]));
    }

    #[test]
    fn empty_selection_falls_back_to_configuration() {
        let config = configured(&["A", "B"], &[]);
        assert_eq!(resolve(&[], &config), channels(&["A", "B"]));
    }

    #[tokio::test]
    async fn partial_channel_failure_does_not_stop_the_rest() {
        let platform = Arc::new(FakePlatform::new());
        platform.fail_target("B");
        platform.fail_target("D");
        let dispatcher = Dispatcher::new(
            Arc::clone(&platform),
            Arc::new(configured(&["A", "B", "C", "D", "E"], &["U1"])),
        );

        let report = dispatcher.dispatch(&[DestinationChoice::All], &notice()).await;

        assert_eq!(report.channels.attempted, 5);
        assert_eq!(report.channels.delivered, 3);
        assert_eq!(report.channels.failed, vec!["B".to_string(), "D".to_string()]);
        assert_eq!(report.direct.delivered, 1);
        assert_eq!(platform.channel_attempts().len(), 5);
    }

    #[tokio::test]
    async fn direct_pass_runs_even_when_every_channel_fails() {
        let platform = Arc::new(FakePlatform::new());
        platform.fail_target("A");
        let dispatcher = Dispatcher::new(
            Arc::clone(&platform),
            Arc::new(configured(&["A"], &["U1", "U2"])),
        );

        let report = dispatcher.dispatch(&[DestinationChoice::All], &notice()).await;

        assert_eq!(report.channels.delivered, 0);
        assert_eq!(report.direct.attempted, 2);
        assert_eq!(report.direct.delivered, 2);
        let direct: Vec<_> = platform
            .direct_attempts()
            .into_iter()
            .map(|a| a.target)
            .collect();
        assert_eq!(direct, vec!["U1".to_string(), "U2".to_string()]);
    }

    #[tokio::test]
    async fn every_target_receives_identical_content() {
        let platform = Arc::new(FakePlatform::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&platform),
            Arc::new(configured(&["A", "B"], &["U1"])),
        );

        dispatcher.dispatch(&[DestinationChoice::All], &notice()).await;

        let attempts = platform.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(
            attempts
                .iter()
                .all(|a| a.message == "Party for room 101" && a.headline == "@here 🎮 Party Up")
        );
    }

    #[tokio::test]
    async fn no_channels_still_notifies_recipients() {
        let platform = Arc::new(FakePlatform::new());
        let dispatcher = Dispatcher::new(Arc::clone(&platform), Arc::new(configured(&[], &["U1"])));

        let report = dispatcher
            .dispatch(&[DestinationChoice::NoneConfigured], &notice())
            .await;

        assert_eq!(report.channels.attempted, 0);
        assert_eq!(report.direct.delivered, 1);
        assert!(report.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_target_does_not_hold_up_the_others() {
        let platform = Arc::new(FakePlatform::new());
        platform.delay_target("A", Duration::from_secs(5));
        platform.delay_target("U1", Duration::from_secs(5));
        let dispatcher = Dispatcher::new(
            Arc::clone(&platform),
            Arc::new(configured(&["A", "B"], &["U1"])),
        );

        let started = tokio::time::Instant::now();
        let report = dispatcher.dispatch(&[DestinationChoice::All], &notice()).await;
        let elapsed = started.elapsed();

        assert!(report.is_complete());
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(10));
        let order: Vec<_> = platform.attempts().into_iter().map(|a| a.target).collect();
        assert_eq!(order[0], "B");
    }
}
