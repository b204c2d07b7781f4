//! Confirmation gate.
//!
//! Renders the preview of an assembled instance and resolves it with either
//! `confirm` or `cancel`. Confirm re-checks freshness against the store's TTL
//! (the same constant the sweeper uses), so an instance the sweeper would
//! already have evicted can never be dispatched.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use herald_types::error::WorkflowError;
use herald_types::notification::Notice;
use herald_types::prompt::{Outcome, Preview};
use herald_types::workflow::{DestinationChoice, Step, WorkflowInstance, WorkflowKey};

use crate::adapter::{ChannelDirectory, DeliveryTransport};
use crate::dispatch::Dispatcher;
use crate::workflow::store::WorkflowStore;

pub struct ConfirmationGate<T: DeliveryTransport, D: ChannelDirectory> {
    store: Arc<WorkflowStore>,
    directory: Arc<D>,
    dispatcher: Dispatcher<T>,
}

impl<T: DeliveryTransport, D: ChannelDirectory> ConfirmationGate<T, D> {
    pub fn new(store: Arc<WorkflowStore>, directory: Arc<D>, dispatcher: Dispatcher<T>) -> Self {
        Self {
            store,
            directory,
            dispatcher,
        }
    }

    /// Build the read-only preview for an instance awaiting confirmation.
    pub async fn preview(&self, instance: &WorkflowInstance) -> Result<Preview, WorkflowError> {
        if instance.step != Step::AwaitingConfirmation {
            return Err(WorkflowError::InvalidTransition {
                step: instance.step,
                action: "preview".to_string(),
            });
        }
        let content = instance.content.clone().ok_or_else(|| {
            WorkflowError::ValidationFailed("message is required".to_string())
        })?;

        let destinations =
            join_all(instance.destinations.iter().map(|choice| self.describe(choice))).await;

        let category = instance.category();
        let profile = category.profile();
        Ok(Preview {
            key: instance.key,
            category,
            title: profile.title.to_string(),
            initiator: instance.initiator.clone(),
            alert: profile.alert,
            destinations,
            message: content.message,
            details: content.details,
            expires_at: self.store.expires_at(instance),
        })
    }

    async fn describe(&self, choice: &DestinationChoice) -> String {
        match choice {
            DestinationChoice::All => "📌 All channels".to_string(),
            DestinationChoice::NoneConfigured => "❌ No channels configured".to_string(),
            DestinationChoice::Channel(id) => match self.directory.lookup(id).await {
                Ok(Some(info)) => format!("# {}", info.name),
                Ok(None) => format!("# {id}"),
                Err(e) => {
                    debug!(channel = %id, error = %e, "lookup failed while rendering preview");
                    format!("# {id}")
                }
            },
        }
    }

    /// Dispatch the instance if it is still fresh.
    ///
    /// The instance is removed before dispatch starts, so a second confirm
    /// of the same key gets `ExpiredOrUnknown` instead of a second fan-out.
    /// It is never put back, whatever the delivery results.
    pub async fn confirm(&self, key: &WorkflowKey) -> Result<Outcome, WorkflowError> {
        let instance = match self.store.consume(key, Step::AwaitingConfirmation, "confirm") {
            Ok(instance) => instance,
            Err(err @ WorkflowError::InvalidTransition { .. }) => {
                // An instance stuck at an earlier step past its TTL is expired,
                // not merely out of order.
                if let Ok(current) = self.store.get(key) {
                    if self.store.is_expired(&current) {
                        self.store.delete(key);
                        return Err(WorkflowError::ExpiredOrUnknown(key.to_string()));
                    }
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let age = self.store.age(&instance);
        if age > self.store.ttl() {
            info!(%key, age_secs = age.as_secs(), "confirm arrived after expiry, not dispatching");
            return Err(WorkflowError::ExpiredOrUnknown(key.to_string()));
        }

        let content = instance.content.ok_or_else(|| {
            warn!(%key, "instance awaiting confirmation without content");
            WorkflowError::ValidationFailed("message is required".to_string())
        })?;

        let notice = Notice {
            category: instance.key.category,
            message: content.message,
            details: content.details,
            sender: instance.initiator,
            origin: instance.origin,
            sent_at: self.store.now(),
        };

        let report = self.dispatcher.dispatch(&instance.destinations, &notice).await;
        Ok(Outcome::Delivered { report })
    }

    /// Remove the instance without dispatching. Succeeds for unknown keys too.
    pub fn cancel(&self, key: &WorkflowKey) -> Outcome {
        match self.store.delete(key) {
            Some(instance) => info!(%key, step = %instance.step, "workflow cancelled"),
            None => debug!(%key, "cancel for unknown workflow"),
        }
        Outcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::FakePlatform;
    use herald_types::config::DestinationSet;
    use herald_types::notification::{AlertLevel, Category};
    use herald_types::workflow::{ChannelId, Content, Initiator, WORKFLOW_TTL};
    use std::time::Duration;

    struct Fixture {
        gate: ConfirmationGate<FakePlatform, FakePlatform>,
        store: Arc<WorkflowStore>,
        platform: Arc<FakePlatform>,
        clock: ManualClock,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::default();
        let store = Arc::new(WorkflowStore::new(Arc::new(clock.clone())));
        let platform = Arc::new(FakePlatform::with_text_channels(&["C1", "C2"]));
        let destinations = Arc::new(DestinationSet::new(
            vec![ChannelId::new("C1"), ChannelId::new("C2")],
            Vec::new(),
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&platform), destinations);
        let gate = ConfirmationGate::new(Arc::clone(&store), Arc::clone(&platform), dispatcher);
        Fixture {
            gate,
            store,
            platform,
            clock,
        }
    }

    /// Drive an instance straight to `step` through the store.
    fn seed(store: &WorkflowStore, step: Step, destinations: Vec<DestinationChoice>) -> WorkflowKey {
        let key = store.create(Category::Urgent, Initiator::new("42", "kenta"), None, 3);
        store
            .update(&key, |instance| {
                instance.destinations = destinations;
                instance.content = Some(Content::new("Server restart at 10pm", None)?);
                instance.step = step;
                Ok(())
            })
            .unwrap();
        key
    }

    #[tokio::test]
    async fn preview_embeds_initiator_and_destinations() {
        let f = fixture();
        let key = seed(
            &f.store,
            Step::AwaitingConfirmation,
            vec![
                DestinationChoice::All,
                DestinationChoice::Channel(ChannelId::new("C2")),
                DestinationChoice::Channel(ChannelId::new("C404")),
            ],
        );
        let instance = f.store.get(&key).unwrap();

        let preview = f.gate.preview(&instance).await.unwrap();

        assert_eq!(preview.initiator.id, "42");
        assert_eq!(preview.alert, AlertLevel::Everyone);
        assert_eq!(preview.title, "🚨 Urgent");
        assert_eq!(
            preview.destinations,
            vec!["📌 All channels", "# chan-C2", "# C404"]
        );
        assert_eq!(
            preview.expires_at - instance.created_at,
            chrono::Duration::minutes(10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn preview_looks_channels_up_concurrently() {
        let f = fixture();
        f.platform.delay_target("C1", Duration::from_secs(5));
        f.platform.delay_target("C2", Duration::from_secs(5));
        let key = seed(
            &f.store,
            Step::AwaitingConfirmation,
            vec![
                DestinationChoice::Channel(ChannelId::new("C1")),
                DestinationChoice::Channel(ChannelId::new("C2")),
            ],
        );
        let instance = f.store.get(&key).unwrap();

        let started = tokio::time::Instant::now();
        let preview = f.gate.preview(&instance).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(preview.destinations, vec!["# chan-C1", "# chan-C2"]);
    }

    #[tokio::test]
    async fn preview_requires_awaiting_confirmation() {
        let f = fixture();
        let key = seed(&f.store, Step::DestinationsSelected, vec![DestinationChoice::All]);
        let instance = f.store.get(&key).unwrap();
        assert!(f.gate.preview(&instance).await.is_err());
    }

    #[tokio::test]
    async fn confirm_dispatches_once_and_removes() {
        let f = fixture();
        let key = seed(&f.store, Step::AwaitingConfirmation, vec![DestinationChoice::All]);

        let outcome = f.gate.confirm(&key).await.unwrap();
        match outcome {
            Outcome::Delivered { report } => assert_eq!(report.channels.delivered, 2),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(f.store.get(&key).is_err());

        let again = f.gate.confirm(&key).await.unwrap_err();
        assert!(matches!(again, WorkflowError::ExpiredOrUnknown(_)));
        assert_eq!(f.platform.attempts().len(), 2);
    }

    #[tokio::test]
    async fn confirm_after_ttl_never_dispatches() {
        let f = fixture();
        let key = seed(&f.store, Step::AwaitingConfirmation, vec![DestinationChoice::All]);

        // Still present in the store: the sweeper has not run.
        f.clock.advance(WORKFLOW_TTL + Duration::from_secs(1));
        assert!(f.store.get(&key).is_ok());

        let err = f.gate.confirm(&key).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ExpiredOrUnknown(_)));
        assert!(f.platform.attempts().is_empty());
        assert!(f.store.get(&key).is_err());
    }

    #[tokio::test]
    async fn confirm_exactly_at_ttl_is_still_fresh() {
        let f = fixture();
        let key = seed(&f.store, Step::AwaitingConfirmation, vec![DestinationChoice::All]);
        f.clock.advance(WORKFLOW_TTL);

        assert!(f.gate.confirm(&key).await.is_ok());
        assert_eq!(f.platform.attempts().len(), 2);
    }

    #[tokio::test]
    async fn confirm_before_content_is_rejected_and_kept() {
        let f = fixture();
        let key = seed(&f.store, Step::DestinationsSelected, vec![DestinationChoice::All]);

        let err = f.gate.confirm(&key).await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert!(f.store.get(&key).is_ok());
        assert!(f.platform.attempts().is_empty());
    }

    #[tokio::test]
    async fn stale_confirm_at_early_step_reports_expiry() {
        let f = fixture();
        let key = seed(&f.store, Step::CategorySelected, Vec::new());
        f.clock.advance(WORKFLOW_TTL + Duration::from_secs(5));

        let err = f.gate.confirm(&key).await.unwrap_err();
        assert!(matches!(err, WorkflowError::ExpiredOrUnknown(_)));
        assert!(f.store.get(&key).is_err());
    }

    #[tokio::test]
    async fn cancel_removes_at_every_step_without_dispatch() {
        let f = fixture();
        for step in [
            Step::CategorySelected,
            Step::DestinationsSelected,
            Step::AwaitingConfirmation,
        ] {
            let key = seed(&f.store, step, vec![DestinationChoice::All]);
            assert!(matches!(f.gate.cancel(&key), Outcome::Cancelled));
            assert!(f.store.get(&key).is_err());
        }
        assert!(f.store.is_empty());
        assert!(f.platform.attempts().is_empty());
    }

    #[tokio::test]
    async fn cancel_of_unknown_key_still_reports_cancelled() {
        let f = fixture();
        let key = seed(&f.store, Step::CategorySelected, Vec::new());
        f.store.delete(&key);
        assert!(matches!(f.gate.cancel(&key), Outcome::Cancelled));
    }
}
