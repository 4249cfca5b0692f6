//! Notification service tying the store, the hub and the waits together.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::notifications::wait::{wait_for_match, wait_for_states};
use crate::notifications::{NotificationStore, ResourceEvent, Subscription};
use crate::resource::{ResourceRef, ServiceRegistry};
use crate::snapshot::Snapshot;
use crate::states::KnownResourceStates;

/// Service configuration.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// State awaited by [`ResourceNotificationService::wait_for_resource`]
    /// when none is given.
    pub default_target_state: String,

    /// Emit a trace record with the full snapshot on every publish.
    pub trace_snapshots: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            default_target_state: KnownResourceStates::RUNNING.to_string(),
            trace_snapshots: false,
        }
    }
}

/// Publishes resource state changes and lets callers watch or wait on them.
///
/// One instance is owned by the orchestrator for its lifetime and shared
/// (e.g. behind an `Arc`) with every component that publishes or watches.
/// The `shutdown` token given at construction ends every watch and wait
/// when the process tears down.
pub struct ResourceNotificationService {
    config: NotificationConfig,
    store: NotificationStore,
    shutdown: CancellationToken,
}

impl ResourceNotificationService {
    /// Create a service with no services exposed to command callbacks.
    pub fn new(config: NotificationConfig, shutdown: CancellationToken) -> Self {
        Self::with_services(config, shutdown, ServiceRegistry::new())
    }

    /// Like [`new`](Self::new), with services exposed to command callbacks.
    pub fn with_services(
        config: NotificationConfig,
        shutdown: CancellationToken,
        services: ServiceRegistry,
    ) -> Self {
        let store = NotificationStore::new(services).with_snapshot_tracing(config.trace_snapshots);
        Self {
            config,
            store,
            shutdown,
        }
    }

    /// The configuration the service was built with.
    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    // --- Publishing ---

    /// Publish a new snapshot for one instance of `resource`.
    pub fn publish<F>(
        &self,
        resource: &ResourceRef,
        instance_id: &str,
        transform: F,
    ) -> Result<ResourceEvent>
    where
        F: FnOnce(&Snapshot) -> Result<Snapshot>,
    {
        self.store.publish(resource, instance_id, transform)
    }

    /// Publish for a single-instance resource, keyed by its own name.
    pub fn publish_resource<F>(&self, resource: &ResourceRef, transform: F) -> Result<ResourceEvent>
    where
        F: FnOnce(&Snapshot) -> Result<Snapshot>,
    {
        self.store.publish(resource, resource.name(), transform)
    }

    /// Latest snapshot of one instance, if anything was published for it.
    pub fn current_snapshot(&self, resource: &ResourceRef, instance_id: &str) -> Option<Snapshot> {
        self.store.current_snapshot(resource, instance_id)
    }

    // --- Watching ---

    /// Replay of every current snapshot, then live events until `cancel`
    /// or shutdown fires.
    pub fn watch(&self, cancel: CancellationToken) -> Subscription {
        self.store.subscribe(cancel, self.shutdown.clone())
    }

    /// Number of live watches, including those behind pending waits.
    pub fn subscriber_count(&self) -> usize {
        self.store.subscription_count()
    }

    // --- Waiting ---

    /// Wait for `resource_name` to reach `target_state`, or the configured
    /// default state when `None`.
    pub fn wait_for_resource(
        &self,
        resource_name: &str,
        target_state: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<String> {
        let target = target_state
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.default_target_state.as_str());
        self.wait_for_resource_states(resource_name, &[target], cancel)
    }

    /// Wait for `resource_name` to reach any of `target_states` and return
    /// the one it reached. Returns immediately if it is already there.
    pub fn wait_for_resource_states(
        &self,
        resource_name: &str,
        target_states: &[&str],
        cancel: CancellationToken,
    ) -> Result<String> {
        let target_states: Vec<String> = target_states.iter().map(|s| s.to_string()).collect();
        wait_for_states(self.watch(cancel), resource_name, &target_states)
    }

    /// Wait until an event for `resource_name` with a non-empty state
    /// satisfies `predicate`.
    pub fn wait_for_resource_matching<P>(
        &self,
        resource_name: &str,
        predicate: P,
        cancel: CancellationToken,
    ) -> Result<ResourceEvent>
    where
        P: FnMut(&ResourceEvent) -> bool,
    {
        wait_for_match(self.watch(cancel), resource_name, predicate)
    }
}

impl Default for ResourceNotificationService {
    fn default() -> Self {
        Self::new(NotificationConfig::default(), CancellationToken::none())
    }
}
