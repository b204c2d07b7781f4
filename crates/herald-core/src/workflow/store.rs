//! In-memory workflow instance store with TTL eviction.
//!
//! `WorkflowStore` is the single owner of every live [`WorkflowInstance`].
//! It is constructed at process start and shared by `Arc` with the
//! sequencer, the gate, and the sweeper; nothing else keeps an instance
//! across calls. Every operation is atomic per key (DashMap shard locks),
//! so a sweep racing an update on the same key makes one of them observe
//! `ExpiredOrUnknown` rather than a half-written instance.
//!
//! Two rapid actions on the same key are serialized by the shard lock but
//! not ordered: whichever arrives second sees the state the first one left.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use herald_types::error::WorkflowError;
use herald_types::notification::Category;
use herald_types::workflow::{
    InstanceId, Initiator, Step, WORKFLOW_TTL, WorkflowInstance, WorkflowKey,
};

use crate::clock::Clock;

pub struct WorkflowStore {
    entries: DashMap<WorkflowKey, WorkflowInstance>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WorkflowStore {
    /// Create a store using the standard [`WORKFLOW_TTL`].
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, WORKFLOW_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Allocate a new instance at `Step::CategorySelected` and return its key.
    pub fn create(
        &self,
        category: Category,
        initiator: Initiator,
        origin: Option<String>,
        max_choices: usize,
    ) -> WorkflowKey {
        let created_at = self.clock.now();
        let mut instance = WorkflowInstance::new(
            WorkflowKey::new(category, InstanceId::new()),
            initiator,
            origin,
            max_choices,
            created_at,
        );

        loop {
            match self.entries.entry(instance.key) {
                Entry::Vacant(slot) => {
                    let key = instance.key;
                    slot.insert(instance);
                    debug!(%key, "created workflow instance");
                    return key;
                }
                Entry::Occupied(_) => {
                    instance.key = WorkflowKey::new(category, InstanceId::new());
                }
            }
        }
    }

    /// Snapshot of the instance stored under `key`.
    pub fn get(&self, key: &WorkflowKey) -> Result<WorkflowInstance, WorkflowError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WorkflowError::ExpiredOrUnknown(key.to_string()))
    }

    /// Apply a state transition under the key's lock.
    ///
    /// The mutator works on a copy; the copy replaces the stored instance
    /// only if the mutator returns `Ok`, so a rejected transition leaves the
    /// instance untouched. The mutator must not call back into the store.
    pub fn update<T, F>(&self, key: &WorkflowKey, mutator: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&mut WorkflowInstance) -> Result<T, WorkflowError>,
    {
        let mut entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| WorkflowError::ExpiredOrUnknown(key.to_string()))?;

        let mut draft = entry.value().clone();
        let output = mutator(&mut draft)?;
        *entry.value_mut() = draft;
        Ok(output)
    }

    /// Remove the instance under `key`. Removing a missing key is a no-op.
    pub fn delete(&self, key: &WorkflowKey) -> Option<WorkflowInstance> {
        let removed = self.entries.remove(key).map(|(_, instance)| instance);
        if removed.is_some() {
            debug!(%key, "deleted workflow instance");
        }
        removed
    }

    /// Atomically remove and return the instance if it is at `expected`.
    ///
    /// A second consumer of the same key gets `ExpiredOrUnknown`, which is
    /// what keeps a double-clicked confirm from dispatching twice.
    pub fn consume(
        &self,
        key: &WorkflowKey,
        expected: Step,
        action: &str,
    ) -> Result<WorkflowInstance, WorkflowError> {
        if let Some((_, instance)) = self
            .entries
            .remove_if(key, |_, instance| instance.step == expected)
        {
            return Ok(instance);
        }

        match self.entries.get(key) {
            Some(entry) => Err(WorkflowError::InvalidTransition {
                step: entry.step,
                action: action.to_string(),
            }),
            None => Err(WorkflowError::ExpiredOrUnknown(key.to_string())),
        }
    }

    /// Age of an instance right now.
    pub fn age(&self, instance: &WorkflowInstance) -> Duration {
        age_at(instance, self.clock.now())
    }

    /// Whether an instance has outlived the TTL.
    pub fn is_expired(&self, instance: &WorkflowInstance) -> bool {
        self.age(instance) > self.ttl
    }

    /// Expiry instant of an instance.
    pub fn expires_at(&self, instance: &WorkflowInstance) -> DateTime<Utc> {
        instance.created_at
            + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }

    /// Remove every instance older than the TTL. Returns how many were removed.
    ///
    /// Age is measured from each instance's `created_at`, independent of when
    /// the previous sweep ran.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut removed = 0;

        self.entries.retain(|key, instance| {
            let keep = age_at(instance, now) <= ttl;
            if !keep {
                removed += 1;
                debug!(%key, "evicting expired workflow instance");
            }
            keep
        });

        if removed > 0 {
            info!(removed, remaining = self.entries.len(), "swept expired workflows");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("live_instances", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn age_at(instance: &WorkflowInstance, now: DateTime<Utc>) -> Duration {
    // A creation time in the future (clock step) counts as age zero.
    (now - instance.created_at).to_std().unwrap_or(Duration::ZERO)
}

/// Run [`WorkflowStore::sweep`] every `every` until `cancel` fires.
///
/// The first sweep happens one full period after spawning.
pub fn spawn_sweeper(
    store: Arc<WorkflowStore>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("workflow sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    store.sweep();
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
