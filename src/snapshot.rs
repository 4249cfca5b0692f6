//! Immutable resource snapshots.
//!
//! A [`Snapshot`] is never changed after it is built. Every `with_*` method
//! returns a new value and leaves the receiver as it was. List fields are
//! shared `Arc<[T]>` slices, so deriving a snapshot copies pointers rather
//! than elements, and an unchanged list can be detected with
//! [`Arc::ptr_eq`].

use crate::types::{
    CommandSnapshot, EnvironmentVariableSnapshot, HealthStatus, PropertySnapshot, ResourceState,
    Timestamp, UrlSnapshot, VolumeSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The observable state of one resource instance at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    resource_type: String,
    properties: Arc<[PropertySnapshot]>,
    creation_timestamp: Option<Timestamp>,
    state: Option<ResourceState>,
    exit_code: Option<i32>,
    health_status: Option<HealthStatus>,
    environment_variables: Arc<[EnvironmentVariableSnapshot]>,
    urls: Arc<[UrlSnapshot]>,
    volumes: Arc<[VolumeSnapshot]>,
    commands: Arc<[CommandSnapshot]>,
}

impl Snapshot {
    /// Empty snapshot for a resource of the given type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties: Arc::from(Vec::new()),
            creation_timestamp: None,
            state: None,
            exit_code: None,
            health_status: None,
            environment_variables: Arc::from(Vec::new()),
            urls: Arc::from(Vec::new()),
            volumes: Arc::from(Vec::new()),
            commands: Arc::from(Vec::new()),
        }
    }

    // --- Accessors ---

    /// Type name shown for the resource, e.g. `"Container"`.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Named properties in insertion order.
    pub fn properties(&self) -> &Arc<[PropertySnapshot]> {
        &self.properties
    }

    /// When the underlying resource was created, if known.
    pub fn creation_timestamp(&self) -> Option<Timestamp> {
        self.creation_timestamp
    }

    /// Current state text and style, if a state was ever set.
    pub fn state(&self) -> Option<&ResourceState> {
        self.state.as_ref()
    }

    /// The state text, if a state is set.
    pub fn state_text(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.text.as_str())
    }

    /// Process exit code once the resource has stopped.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Last reported health. `None` until a health check has run.
    pub fn health_status(&self) -> Option<HealthStatus> {
        self.health_status
    }

    /// Environment the resource was started with.
    pub fn environment_variables(&self) -> &Arc<[EnvironmentVariableSnapshot]> {
        &self.environment_variables
    }

    /// Endpoints the resource exposes.
    pub fn urls(&self) -> &Arc<[UrlSnapshot]> {
        &self.urls
    }

    /// Volume and bind mounts.
    pub fn volumes(&self) -> &Arc<[VolumeSnapshot]> {
        &self.volumes
    }

    /// Commands as last reconciled. An unchanged list keeps its `Arc`.
    pub fn commands(&self) -> &Arc<[CommandSnapshot]> {
        &self.commands
    }

    // --- Derivation ---

    /// Copy with a different resource type.
    pub fn with_resource_type(&self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..self.clone()
        }
    }

    /// Copy with the whole property list replaced.
    pub fn with_properties(&self, properties: impl Into<Arc<[PropertySnapshot]>>) -> Self {
        Self {
            properties: properties.into(),
            ..self.clone()
        }
    }

    /// Replace the property with the same name, or append it.
    pub fn with_property(&self, property: PropertySnapshot) -> Self {
        let mut properties = self.properties.to_vec();
        match properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => properties.push(property),
        }
        self.with_properties(properties)
    }

    pub fn with_creation_timestamp(&self, timestamp: Option<Timestamp>) -> Self {
        Self {
            creation_timestamp: timestamp,
            ..self.clone()
        }
    }

    /// Copy with a new state. Accepts a plain `&str` for an unstyled state.
    pub fn with_state(&self, state: impl Into<ResourceState>) -> Self {
        Self {
            state: Some(state.into()),
            ..self.clone()
        }
    }

    /// Copy with the state cleared.
    pub fn without_state(&self) -> Self {
        Self {
            state: None,
            ..self.clone()
        }
    }

    pub fn with_exit_code(&self, exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            ..self.clone()
        }
    }

    pub fn with_health_status(&self, health_status: Option<HealthStatus>) -> Self {
        Self {
            health_status,
            ..self.clone()
        }
    }

    pub fn with_environment_variables(
        &self,
        environment_variables: impl Into<Arc<[EnvironmentVariableSnapshot]>>,
    ) -> Self {
        Self {
            environment_variables: environment_variables.into(),
            ..self.clone()
        }
    }

    pub fn with_urls(&self, urls: impl Into<Arc<[UrlSnapshot]>>) -> Self {
        Self {
            urls: urls.into(),
            ..self.clone()
        }
    }

    pub fn with_volumes(&self, volumes: impl Into<Arc<[VolumeSnapshot]>>) -> Self {
        Self {
            volumes: volumes.into(),
            ..self.clone()
        }
    }

    /// Copy with the command list replaced. Usually left to reconciliation.
    pub fn with_commands(&self, commands: impl Into<Arc<[CommandSnapshot]>>) -> Self {
        Self {
            commands: commands.into(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandState;

    #[test]
    fn test_derivation_leaves_original_untouched() {
        let base = Snapshot::new("Container").with_state("Starting");
        let next = base.with_state("Running").with_exit_code(Some(0));

        assert_eq!(base.state_text(), Some("Starting"));
        assert_eq!(base.exit_code(), None);
        assert_eq!(next.state_text(), Some("Running"));
        assert_eq!(next.exit_code(), Some(0));
        assert_eq!(next.resource_type(), "Container");
    }

    #[test]
    fn test_untouched_lists_are_shared() {
        let base = Snapshot::new("Project").with_commands(vec![CommandSnapshot {
            command_type: "stop".to_string(),
            state: CommandState::Enabled,
            display_name: "Stop".to_string(),
            icon_name: None,
            is_highlighted: false,
        }]);
        let next = base.with_state("Running");

        assert!(Arc::ptr_eq(base.commands(), next.commands()));
        assert!(Arc::ptr_eq(base.urls(), next.urls()));
    }

    #[test]
    fn test_with_property_replaces_by_name() {
        let snapshot = Snapshot::new("Executable")
            .with_property(PropertySnapshot::new("pid", 10))
            .with_property(PropertySnapshot::new("path", "/bin/app"))
            .with_property(PropertySnapshot::new("pid", 11));

        let props = snapshot.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "pid");
        assert_eq!(props[0].value, serde_json::json!(11));
        assert_eq!(props[1].name, "path");
    }

    #[test]
    fn test_serializes_optional_fields() {
        let snapshot = Snapshot::new("Container")
            .with_state(ResourceState::with_style("Running", "success"))
            .with_health_status(Some(HealthStatus::Healthy));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["resource_type"], "Container");
        assert_eq!(json["state"]["style"], "success");
        assert_eq!(json["health_status"], "healthy");
        assert!(json["exit_code"].is_null());
    }
}
