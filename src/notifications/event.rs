//! Published resource events.

use crate::resource::ResourceRef;
use crate::snapshot::Snapshot;

/// One observed transition of a resource instance.
#[derive(Clone, Debug)]
pub struct ResourceEvent {
    resource: ResourceRef,
    instance_id: String,
    snapshot: Snapshot,
}

impl ResourceEvent {
    pub fn new(resource: ResourceRef, instance_id: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            resource,
            instance_id: instance_id.into(),
            snapshot,
        }
    }

    /// The resource that changed.
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Distinguishes replicas of one resource. Equals the resource name for
    /// single-instance resources.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// State of the instance after the change.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}
