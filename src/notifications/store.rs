//! Last-known snapshot per resource instance, and the publish path.

use crate::cancel::CancellationToken;
use crate::commands::reconcile_commands;
use crate::error::Result;
use crate::resource::{ResourceRef, ServiceRegistry};
use crate::snapshot::Snapshot;
use crate::states::eq_ignore_case;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

use super::event::ResourceEvent;
use super::hub::{BroadcastHub, Subscription};

/// Store key: a resource and one of its instance ids.
type EntryKey = (ResourceRef, String);

/// Latest snapshot of one resource instance.
#[derive(Default)]
struct NotificationEntry {
    /// Held from transform through broadcast; orders publishes per key.
    publish_lock: Mutex<()>,
    /// Written under `publish_lock`, read without it by replay.
    latest: RwLock<Option<Snapshot>>,
}

/// Owns the last-known snapshots and the hub that broadcasts changes.
///
/// Publishes to the same resource instance are serialized and broadcast in
/// the order they took the entry lock. Publishes to different instances run
/// in parallel.
pub struct NotificationStore {
    entries: RwLock<HashMap<EntryKey, Arc<NotificationEntry>>>,
    hub: BroadcastHub,
    services: ServiceRegistry,
    trace_snapshots: bool,
}

impl NotificationStore {
    /// Create an empty store whose command callbacks see `services`.
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hub: BroadcastHub::new(),
            services,
            trace_snapshots: false,
        }
    }

    /// Emit a trace record with the full snapshot on every publish.
    pub fn with_snapshot_tracing(mut self, enabled: bool) -> Self {
        self.trace_snapshots = enabled;
        self
    }

    /// Derive the next snapshot of `resource`/`instance_id` with `transform`,
    /// store it and broadcast it.
    ///
    /// `transform` receives the latest snapshot, or the resource's initial
    /// snapshot (else an empty one of its declared type) before the first
    /// publish. Commands are then reconciled against the resource's
    /// annotations. If `transform` or a command callback fails, nothing is
    /// stored or broadcast and the error is returned.
    pub fn publish<F>(
        &self,
        resource: &ResourceRef,
        instance_id: &str,
        transform: F,
    ) -> Result<ResourceEvent>
    where
        F: FnOnce(&Snapshot) -> Result<Snapshot>,
    {
        let entry = self.entry(resource, instance_id);
        let _publish = entry.publish_lock.lock();

        let stored = entry.latest.read().clone();
        let previous = match stored {
            Some(snapshot) => snapshot,
            None => initial_snapshot_for(resource),
        };

        let candidate = transform(&previous)?;
        let commands =
            reconcile_commands(resource.command_annotations(), &candidate, &self.services)?;
        let next = if Arc::ptr_eq(&commands, candidate.commands()) {
            candidate
        } else {
            candidate.with_commands(commands)
        };

        *entry.latest.write() = Some(next.clone());

        let event = ResourceEvent::new(resource.clone(), instance_id, next);
        // Still under the publish lock: broadcast order matches store order.
        self.hub.broadcast(&event);

        self.log_publish(resource, instance_id, &previous, event.snapshot());

        Ok(event)
    }

    /// Latest stored snapshot, if anything was published for the key.
    pub fn current_snapshot(&self, resource: &ResourceRef, instance_id: &str) -> Option<Snapshot> {
        let key = (resource.clone(), instance_id.to_string());
        let entry = self.entries.read().get(&key).cloned()?;
        let latest = entry.latest.read().clone();
        latest
    }

    /// Stream of every current snapshot followed by live events.
    pub fn subscribe(&self, cancel: CancellationToken, shutdown: CancellationToken) -> Subscription {
        self.hub.subscribe(cancel, shutdown, || self.replay())
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.hub.subscription_count()
    }

    /// Number of resource instances ever published or touched.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn replay(&self) -> Vec<ResourceEvent> {
        let entries = self.entries.read();
        entries
            .iter()
            .filter_map(|((resource, instance_id), entry)| {
                let latest = entry.latest.read();
                latest.as_ref().map(|snapshot| {
                    ResourceEvent::new(resource.clone(), instance_id.as_str(), snapshot.clone())
                })
            })
            .collect()
    }

    /// Get or create the entry for a key.
    fn entry(&self, resource: &ResourceRef, instance_id: &str) -> Arc<NotificationEntry> {
        let key = (resource.clone(), instance_id.to_string());

        if let Some(entry) = self.entries.read().get(&key) {
            return Arc::clone(entry);
        }

        // Re-checked under the write lock so concurrent first publishes
        // share one entry.
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_default())
    }

    fn log_publish(
        &self,
        resource: &ResourceRef,
        instance_id: &str,
        previous: &Snapshot,
        next: &Snapshot,
    ) {
        let new_state = next.state_text().filter(|s| !s.trim().is_empty());
        if let Some(new_state) = new_state {
            match previous.state_text().filter(|s| !s.trim().is_empty()) {
                Some(old_state) if !eq_ignore_case(old_state, new_state) => {
                    tracing::debug!(
                        resource = resource.name(),
                        instance_id,
                        "Resource {}/{} changed state: {} -> {}",
                        resource.name(),
                        instance_id,
                        old_state,
                        new_state
                    );
                }
                Some(_) => {}
                None => {
                    tracing::debug!(
                        resource = resource.name(),
                        instance_id,
                        "Resource {}/{} changed state: {}",
                        resource.name(),
                        instance_id,
                        new_state
                    );
                }
            }
        }

        if self.trace_snapshots {
            tracing::trace!(
                resource = resource.name(),
                instance_id,
                resource_type = next.resource_type(),
                creation_timestamp = ?next.creation_timestamp(),
                state = next.state_text(),
                state_style = next.state().and_then(|s| s.style.as_deref()),
                health_status = ?next.health_status(),
                exit_code = ?next.exit_code(),
                environment = %join_pairs(
                    next.environment_variables()
                        .iter()
                        .map(|e| (e.name.as_str(), e.value.clone().unwrap_or_default()))
                ),
                urls = %join_pairs(next.urls().iter().map(|u| (u.name.as_str(), u.url.clone()))),
                properties = %join_pairs(
                    next.properties()
                        .iter()
                        .map(|p| (p.name.as_str(), p.value.to_string()))
                ),
                "resource update published"
            );
        }
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(ServiceRegistry::new())
    }
}

/// Snapshot used before the first publish for a key.
fn initial_snapshot_for(resource: &ResourceRef) -> Snapshot {
    resource
        .initial_snapshot()
        .unwrap_or_else(|| Snapshot::new(resource.resource_type()))
}

fn join_pairs<'a>(pairs: impl Iterator<Item = (&'a str, String)>) -> String {
    pairs
        .map(|(name, value)| format!("{name} = {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
