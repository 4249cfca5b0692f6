//! Broadcast hub distributing resource events to live subscriptions.

use crate::cancel::{earliest_deadline, CancellationToken};
use crossbeam_channel::{select, unbounded, Receiver, Sender, TryRecvError};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::event::ResourceEvent;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

struct HubInner {
    /// Live delivery queues by subscription. Guarded separately from any
    /// notification entry lock.
    subscribers: RwLock<HashMap<SubscriptionId, Sender<ResourceEvent>>>,
    next_id: AtomicU64,
}

impl HubInner {
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // Dropping the sender closes the queue; the receiver still drains
        // what was already delivered.
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            tracing::trace!(subscription = id.0, "subscription detached");
        }
        removed
    }
}

/// Fans out every published event to all registered subscriptions.
///
/// Each subscription has its own unbounded queue, so a stalled consumer
/// never blocks the publisher or other consumers. The hub runs no thread of
/// its own.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    /// Create a hub with no subscriptions.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a subscription whose stream starts with `replay()`.
    ///
    /// `replay` runs while the registry is write-locked, so no broadcast
    /// can land between reading current state and going live. Any event
    /// broadcast afterwards is delivered live, even if its snapshot was
    /// already stored in time to be part of the replay.
    ///
    /// The lock is held for the whole of `replay`. Every broadcast, and so
    /// every publisher, waits that long; with a store's replay that is
    /// proportional to the number of stored instances.
    pub fn subscribe<F>(
        &self,
        cancel: CancellationToken,
        shutdown: CancellationToken,
        replay: F,
    ) -> Subscription
    where
        F: FnOnce() -> Vec<ResourceEvent>,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = unbounded();

        let replay = {
            let mut subs = self.inner.subscribers.write();
            let replay = replay();
            subs.insert(id, sender);
            replay
        };

        tracing::trace!(subscription = id.0, replay = replay.len(), "subscription registered");

        Subscription {
            id,
            hub: Arc::clone(&self.inner),
            replay: replay.into(),
            receiver,
            cancel,
            shutdown,
            phase: Phase::Live,
        }
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }

    /// Number of subscriptions currently receiving live events.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Deliver `event` to every registered subscription without blocking.
    pub fn broadcast(&self, event: &ResourceEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.inner.subscribers.read();
            for (id, sender) in subs.iter() {
                // Unbounded send only fails once the receiver is gone.
                if sender.send(event.clone()).is_err() {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.inner.subscribers.write();
            for id in to_remove {
                if subs.remove(&id).is_some() {
                    tracing::debug!(subscription = id.0, "pruned subscription with dropped receiver");
                }
            }
        }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Registered and receiving.
    Live,
    /// Detached; yielding what was queued before detaching.
    Draining,
    Closed,
}

/// A stream of resource events: first the replay of current snapshots, then
/// live events until cancelled.
///
/// Iteration blocks while the queue is empty. When the subscription's token
/// or the shutdown signal fires, the subscription detaches from the hub,
/// yields the events already queued and then ends. Dropping it detaches as
/// well.
///
/// Replay and live events together are at-least-once and ordered per
/// resource instance: the same snapshot may appear in the replay and again
/// as a live event, but an older snapshot never follows a newer one.
pub struct Subscription {
    id: SubscriptionId,
    hub: Arc<HubInner>,
    replay: VecDeque<ResourceEvent>,
    receiver: Receiver<ResourceEvent>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
    phase: Phase,
}

impl Subscription {
    /// Identifier under which the hub knows this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Events of the replay phase not yet consumed.
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// True once the subscription no longer receives live events.
    pub fn is_detached(&self) -> bool {
        self.phase != Phase::Live
    }

    /// Stop receiving live events. Already queued events remain readable.
    pub fn detach(&mut self) {
        if self.phase == Phase::Live {
            self.hub.unsubscribe(self.id);
            self.phase = Phase::Draining;
        }
    }

    fn next_live(&mut self) -> Option<ResourceEvent> {
        let deadline = earliest_deadline(&[&self.cancel, &self.shutdown]);

        select! {
            recv(self.receiver) -> event => match event {
                Ok(event) => return Some(event),
                Err(_) => {
                    self.phase = Phase::Closed;
                    return None;
                }
            },
            recv(self.cancel.signal()) -> _ => {},
            recv(self.shutdown.signal()) -> _ => {},
            recv(deadline) -> _ => {},
        }

        self.detach();
        self.next_draining()
    }

    fn next_draining(&mut self) -> Option<ResourceEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                self.phase = Phase::Closed;
                None
            }
        }
    }
}

impl Iterator for Subscription {
    type Item = ResourceEvent;

    fn next(&mut self) -> Option<ResourceEvent> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }

        match self.phase {
            Phase::Live => self.next_live(),
            Phase::Draining => self.next_draining(),
            Phase::Closed => None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending_replay", &self.replay.len())
            .field("phase", &self.phase)
            .finish()
    }
}
