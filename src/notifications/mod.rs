//! Resource state notifications.
//!
//! This module keeps the last known snapshot of every resource instance and
//! streams changes to any number of watchers:
//! - Publishing derives a new snapshot from the previous one under a
//!   per-instance lock and broadcasts it
//! - Subscribing replays every current snapshot, then streams live events
//! - Waits block until a resource reaches a state, honoring cancellation
//!
//! # Example
//!
//! ```ignore
//! let store = NotificationStore::default();
//! let web = ResourceDefinition::new("web", "Project").into_ref();
//!
//! store.publish(&web, "web", |s| Ok(s.with_state("Running")))?;
//!
//! for event in store.subscribe(CancellationToken::none(), CancellationToken::none()) {
//!     println!("{} -> {:?}", event.resource().name(), event.snapshot().state_text());
//! }
//! ```

mod event;
mod hub;
mod store;
pub(crate) mod wait;

pub use event::ResourceEvent;
pub use hub::{BroadcastHub, Subscription, SubscriptionId};
pub use store::NotificationStore;
