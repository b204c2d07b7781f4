//! Step sequencer: validates each user action against the instance's current
//! step and produces the next prompt.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use herald_types::config::DestinationSet;
use herald_types::error::WorkflowError;
use herald_types::notification::Category;
use herald_types::prompt::{
    CategoryOption, CategoryPrompt, ContentPrompt, DestinationOption, DestinationPrompt,
};
use herald_types::workflow::{
    Content, DETAILS_MAX_CHARS, DestinationChoice, Initiator, MAX_DESTINATION_CHOICES,
    MESSAGE_MAX_CHARS, Step, WorkflowInstance, WorkflowKey,
};

use crate::adapter::ChannelDirectory;
use crate::workflow::store::WorkflowStore;

pub struct Sequencer<D: ChannelDirectory> {
    store: Arc<WorkflowStore>,
    directory: Arc<D>,
    destinations: Arc<DestinationSet>,
}

impl<D: ChannelDirectory> Sequencer<D> {
    pub fn new(
        store: Arc<WorkflowStore>,
        directory: Arc<D>,
        destinations: Arc<DestinationSet>,
    ) -> Self {
        Self {
            store,
            directory,
            destinations,
        }
    }

    /// The category choice offered when a workflow is triggered.
    pub fn categories(&self) -> CategoryPrompt {
        CategoryPrompt {
            options: Category::ALL
                .into_iter()
                .map(|category| CategoryOption {
                    category,
                    label: category.profile().title.to_string(),
                })
                .collect(),
        }
    }

    /// Create an instance for `category` and build its destination prompt.
    ///
    /// With no configured channels the only option is the "no channels"
    /// sentinel, so the workflow can still complete. Otherwise the "all"
    /// sentinel comes first, followed by every configured channel the
    /// directory reports as an existing text channel. Channels whose lookup
    /// fails are left out; only when every lookup fails is `start` an
    /// adapter fault.
    pub async fn start(
        &self,
        category: Category,
        initiator: Initiator,
        origin: Option<String>,
    ) -> Result<DestinationPrompt, WorkflowError> {
        let options = self.destination_options().await?;
        let max_choices = options.len().min(MAX_DESTINATION_CHOICES);

        let key = self.store.create(category, initiator, origin, max_choices);
        debug!(%key, options = options.len(), max_choices, "workflow started");

        Ok(DestinationPrompt {
            key,
            category,
            title: category.profile().title.to_string(),
            options,
            min_choices: 1,
            max_choices,
        })
    }

    async fn destination_options(&self) -> Result<Vec<DestinationOption>, WorkflowError> {
        if !self.destinations.has_channels() {
            return Ok(vec![DestinationOption {
                choice: DestinationChoice::NoneConfigured,
                label: "❌ No channels configured".to_string(),
                description: "Set NOTIFY_CHANNEL_IDS to enable broadcast channels".to_string(),
            }]);
        }

        let mut options = vec![DestinationOption {
            choice: DestinationChoice::All,
            label: "📌 All channels".to_string(),
            description: "Send to every configured channel".to_string(),
        }];

        let channels = &self.destinations.channels;
        let lookups = join_all(channels.iter().map(|channel| self.directory.lookup(channel))).await;

        let mut unreadable = 0;
        for (channel, lookup) in channels.iter().zip(lookups) {
            match lookup {
                Ok(Some(info)) if info.text_capable => options.push(DestinationOption {
                    choice: DestinationChoice::Channel(info.id.clone()),
                    label: format!("# {}", info.name),
                    description: format!("Channel ID: {}", info.id),
                }),
                Ok(Some(_)) => debug!(channel = %channel, "skipping non-text channel"),
                Ok(None) => warn!(channel = %channel, "configured channel not found"),
                Err(e) => {
                    unreadable += 1;
                    warn!(channel = %channel, error = %e, "channel lookup failed, leaving it out");
                }
            }
        }

        if unreadable == channels.len() {
            return Err(WorkflowError::Adapter(format!(
                "channel lookup failed for all {unreadable} configured channels"
            )));
        }

        Ok(options)
    }

    /// Record the destination selection and ask for content.
    pub fn select_destinations(
        &self,
        key: &WorkflowKey,
        values: &[String],
    ) -> Result<ContentPrompt, WorkflowError> {
        let mut selection: Vec<DestinationChoice> = Vec::with_capacity(values.len());
        for value in values {
            let choice = DestinationChoice::from_value(value).map_err(WorkflowError::ValidationFailed)?;
            if !selection.contains(&choice) {
                selection.push(choice);
            }
        }

        self.store.update(key, |instance| {
            expect_step(instance, Step::CategorySelected, "pick_destinations")?;
            if selection.is_empty() || selection.len() > instance.max_choices {
                return Err(WorkflowError::ValidationFailed(format!(
                    "select between 1 and {} destinations, got {}",
                    instance.max_choices,
                    selection.len()
                )));
            }
            instance.destinations = selection;
            instance.advance(Step::DestinationsSelected)
        })?;

        debug!(%key, "destinations selected");
        let category = key.category;
        let profile = category.profile();
        Ok(ContentPrompt {
            key: *key,
            category,
            title: profile.title.to_string(),
            placeholder: profile.placeholder.to_string(),
            message_max_chars: MESSAGE_MAX_CHARS,
            details_max_chars: DETAILS_MAX_CHARS,
        })
    }

    /// Record validated content and move the instance to
    /// `AwaitingConfirmation`. Returns the assembled instance for the gate.
    pub fn submit_content(
        &self,
        key: &WorkflowKey,
        message: String,
        details: Option<String>,
    ) -> Result<WorkflowInstance, WorkflowError> {
        let instance = self.store.update(key, |instance| {
            expect_step(instance, Step::DestinationsSelected, "submit_content")?;
            instance.content = Some(Content::new(message, details)?);
            instance.advance(Step::ContentEntered)?;
            instance.advance(Step::AwaitingConfirmation)?;
            Ok(instance.clone())
        })?;

        debug!(%key, "content entered, awaiting confirmation");
        Ok(instance)
    }
}

fn expect_step(instance: &WorkflowInstance, expected: Step, action: &str) -> Result<(), WorkflowError> {
    if instance.step == expected {
        Ok(())
    } else {
        Err(WorkflowError::InvalidTransition {
            step: instance.step,
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::FakePlatform;
    use herald_types::workflow::ChannelId;
    use std::time::Duration;

    fn sequencer(channels: &[&str], platform: FakePlatform) -> (Sequencer<FakePlatform>, Arc<WorkflowStore>) {
        let store = Arc::new(WorkflowStore::new(Arc::new(ManualClock::default())));
        let destinations = DestinationSet::new(
            channels.iter().map(|id| ChannelId::new(*id)).collect(),
            Vec::new(),
        );
        let seq = Sequencer::new(Arc::clone(&store), Arc::new(platform), Arc::new(destinations));
        (seq, store)
    }

    fn initiator() -> Initiator {
        Initiator::new("42", "kenta")
    }

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn categories_are_offered_in_order() {
        let (seq, _) = sequencer(&[], FakePlatform::new());
        let prompt = seq.categories();
        let ids: Vec<_> = prompt.options.iter().map(|o| o.category.id()).collect();
        assert_eq!(ids, vec!["boss", "team", "general", "urgent"]);
        assert_eq!(prompt.options[3].label, "🚨 Urgent");
    }

    #[tokio::test]
    async fn start_offers_all_plus_text_channels() {
        let platform = FakePlatform::with_text_channels(&["C1", "C2"]);
        platform.add_channel("V1", "voice", false);
        let (seq, store) = sequencer(&["C1", "V1", "C2", "GONE"], platform);

        let prompt = seq.start(Category::Boss, initiator(), None).await.unwrap();

        let values: Vec<_> = prompt.options.iter().map(|o| o.choice.as_value()).collect();
        assert_eq!(values, vec!["all_channels", "C1", "C2"]);
        assert_eq!(prompt.options[1].label, "# chan-C1");
        assert_eq!(prompt.min_choices, 1);
        assert_eq!(prompt.max_choices, 3);
        assert_eq!(store.get(&prompt.key).unwrap().step, Step::CategorySelected);
    }

    #[tokio::test]
    async fn start_without_channels_offers_none_sentinel() {
        let (seq, _) = sequencer(&[], FakePlatform::new());
        let prompt = seq.start(Category::General, initiator(), None).await.unwrap();

        assert_eq!(prompt.options.len(), 1);
        assert_eq!(prompt.options[0].choice, DestinationChoice::NoneConfigured);
        assert_eq!(prompt.max_choices, 1);
    }

    #[tokio::test]
    async fn max_choices_is_capped_at_ten() {
        let ids: Vec<String> = (0..15).map(|i| format!("C{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let (seq, _) = sequencer(&refs, FakePlatform::with_text_channels(&refs));

        let prompt = seq.start(Category::Team, initiator(), None).await.unwrap();
        assert_eq!(prompt.options.len(), 16);
        assert_eq!(prompt.max_choices, 10);
    }

    #[tokio::test]
    async fn unreadable_channel_is_left_out() {
        let platform = FakePlatform::with_text_channels(&["C1", "PRIVATE", "C2"]);
        platform.deny_lookup("PRIVATE");
        let (seq, store) = sequencer(&["C1", "PRIVATE", "C2"], platform);

        let prompt = seq.start(Category::Urgent, initiator(), None).await.unwrap();

        let values: Vec<_> = prompt.options.iter().map(|o| o.choice.as_value()).collect();
        assert_eq!(values, vec!["all_channels", "C1", "C2"]);
        assert_eq!(prompt.max_choices, 3);
        assert!(store.get(&prompt.key).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn channel_lookups_run_concurrently() {
        let platform = FakePlatform::with_text_channels(&["C1", "C2", "C3"]);
        for id in ["C1", "C2", "C3"] {
            platform.delay_target(id, Duration::from_secs(5));
        }
        let (seq, _) = sequencer(&["C1", "C2", "C3"], platform);

        let started = tokio::time::Instant::now();
        let prompt = seq.start(Category::Team, initiator(), None).await.unwrap();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(10), "lookups ran one after another: {elapsed:?}");
        let values: Vec<_> = prompt.options.iter().map(|o| o.choice.as_value()).collect();
        assert_eq!(values, vec!["all_channels", "C1", "C2", "C3"]);
    }

    #[tokio::test]
    async fn directory_failure_for_every_channel_is_an_adapter_fault() {
        let platform = FakePlatform::with_text_channels(&["C1"]);
        platform.take_directory_down();
        let (seq, store) = sequencer(&["C1"], platform);

        let err = seq.start(Category::Boss, initiator(), None).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Adapter(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn selection_count_is_validated_and_retryable() {
        let (seq, store) = sequencer(&["C1"], FakePlatform::with_text_channels(&["C1"]));
        let prompt = seq.start(Category::Boss, initiator(), None).await.unwrap();
        assert_eq!(prompt.max_choices, 2);

        let err = seq.select_destinations(&prompt.key, &[]).unwrap_err();
        assert!(matches!(err, WorkflowError::ValidationFailed(_)));

        let err = seq
            .select_destinations(&prompt.key, &values(&["all_channels", "C1", "C9"]))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ValidationFailed(_)));
        assert_eq!(store.get(&prompt.key).unwrap().step, Step::CategorySelected);

        // Duplicates collapse before counting.
        let content = seq
            .select_destinations(&prompt.key, &values(&["C1", "C1"]))
            .unwrap();
        assert_eq!(content.message_max_chars, 1000);
        assert_eq!(content.details_max_chars, 500);
        let instance = store.get(&prompt.key).unwrap();
        assert_eq!(instance.step, Step::DestinationsSelected);
        assert_eq!(
            instance.destinations,
            vec![DestinationChoice::Channel(ChannelId::new("C1"))]
        );
    }

    #[tokio::test]
    async fn out_of_order_actions_are_rejected_without_mutation() {
        let (seq, store) = sequencer(&["C1"], FakePlatform::with_text_channels(&["C1"]));
        let prompt = seq.start(Category::Boss, initiator(), None).await.unwrap();

        let err = seq
            .submit_content(&prompt.key, "too early".to_string(), None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        seq.select_destinations(&prompt.key, &values(&["C1"])).unwrap();
        let err = seq
            .select_destinations(&prompt.key, &values(&["all_channels"]))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        let instance = store.get(&prompt.key).unwrap();
        assert_eq!(instance.step, Step::DestinationsSelected);
        assert!(instance.content.is_none());
    }

    #[tokio::test]
    async fn content_bounds_leave_instance_retryable() {
        let (seq, store) = sequencer(&[], FakePlatform::new());
        let prompt = seq.start(Category::General, initiator(), None).await.unwrap();
        seq.select_destinations(&prompt.key, &values(&["no_channels"]))
            .unwrap();

        for (message, details) in [
            (String::new(), None),
            ("a".repeat(1001), None),
            ("ok".to_string(), Some("d".repeat(501))),
        ] {
            let err = seq.submit_content(&prompt.key, message, details).unwrap_err();
            assert!(matches!(err, WorkflowError::ValidationFailed(_)));
            assert_eq!(store.get(&prompt.key).unwrap().step, Step::DestinationsSelected);
        }

        let instance = seq
            .submit_content(&prompt.key, "a".repeat(1000), Some(String::new()))
            .unwrap();
        assert_eq!(instance.step, Step::AwaitingConfirmation);
        assert_eq!(instance.content.unwrap().details, None);
    }

    #[tokio::test]
    async fn unknown_key_is_expired_or_unknown() {
        let (seq, store) = sequencer(&[], FakePlatform::new());
        let prompt = seq.start(Category::General, initiator(), None).await.unwrap();
        store.delete(&prompt.key);

        let err = seq
            .select_destinations(&prompt.key, &values(&["no_channels"]))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::ExpiredOrUnknown(_)));
    }
}
