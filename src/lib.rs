//! # Resource Watch
//!
//! Tracks the last known state of every managed resource instance and lets
//! any number of observers watch state transitions as they happen.
//!
//! ## Core Concepts
//!
//! - **Snapshots**: Immutable descriptions of a resource instance's state
//! - **Publishing**: Derive the next snapshot from the previous one, per
//!   instance, in a strict order
//! - **Commands**: Reconciled against a resource's declared annotations on
//!   every publish
//! - **Watching**: Late subscribers get a replay of current state, then live
//!   events; waits block until a resource reaches a state
//!
//! ## Example
//!
//! ```ignore
//! use resource_watch::{
//!     CancellationSource, CancellationToken, NotificationConfig, ResourceDefinition,
//!     ResourceNotificationService,
//! };
//!
//! let shutdown = CancellationSource::new();
//! let service = ResourceNotificationService::new(NotificationConfig::default(), shutdown.token());
//! let web = ResourceDefinition::new("web", "Project").into_ref();
//!
//! // Publish a transition
//! service.publish_resource(&web, |s| Ok(s.with_state("Running")))?;
//!
//! // Block until it is running
//! let state = service.wait_for_resource("web", None, CancellationToken::none())?;
//! ```

pub mod cancel;
pub mod commands;
pub mod error;
pub mod notifications;
pub mod projection;
pub mod resource;
pub mod service;
pub mod snapshot;
pub mod states;
pub mod types;

// Re-exports
pub use cancel::{CancellationSource, CancellationToken};
pub use commands::reconcile_commands;
pub use error::{BoxError, NotificationError, Result};
pub use notifications::{
    BroadcastHub, NotificationStore, ResourceEvent, Subscription, SubscriptionId,
};
pub use projection::{HealthStateKind, ResourceView};
pub use resource::{
    CommandAnnotation, Resource, ResourceDefinition, ResourceRef, ServiceRegistry,
    UpdateCommandStateContext,
};
pub use service::{NotificationConfig, ResourceNotificationService};
pub use snapshot::Snapshot;
pub use states::{KnownResourceStateStyles, KnownResourceStates};
pub use types::*;
