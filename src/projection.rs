//! Flat, serializable view of a resource event for remote watchers.
//!
//! Unset optional fields map to the empty value of their wire type: `""`
//! for text, `0` for numbers and `Unspecified` for health.

use crate::notifications::ResourceEvent;
use crate::types::{CommandState, HealthStatus};
use serde::{Deserialize, Serialize};

/// Health as exposed on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStateKind {
    #[default]
    Unspecified,
    Healthy,
    Degraded,
    Unhealthy,
}

impl From<Option<HealthStatus>> for HealthStateKind {
    fn from(status: Option<HealthStatus>) -> Self {
        match status {
            None => HealthStateKind::Unspecified,
            Some(HealthStatus::Healthy) => HealthStateKind::Healthy,
            Some(HealthStatus::Degraded) => HealthStateKind::Degraded,
            Some(HealthStatus::Unhealthy) => HealthStateKind::Unhealthy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyView {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariableView {
    pub name: String,
    pub value: String,
    pub is_from_spec: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlView {
    pub name: String,
    pub full_url: String,
    pub is_internal: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeView {
    pub source: String,
    pub target: String,
    pub mount_type: String,
    pub is_read_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandView {
    pub command_type: String,
    pub display_name: String,
    pub icon_name: String,
    pub is_highlighted: bool,
    pub state: CommandState,
}

/// One resource instance as sent to a remote watcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    pub name: String,
    pub resource_type: String,
    /// The instance id.
    pub uid: String,
    pub state: String,
    pub state_style: String,
    pub health_state: HealthStateKind,
    /// Microseconds since Unix epoch.
    pub created_at: i64,
    pub exit_code: i32,
    pub environment: Vec<EnvironmentVariableView>,
    pub urls: Vec<UrlView>,
    pub properties: Vec<PropertyView>,
    pub volumes: Vec<VolumeView>,
    pub commands: Vec<CommandView>,
}

impl ResourceView {
    pub fn from_event(event: &ResourceEvent) -> Self {
        let snapshot = event.snapshot();
        let state = snapshot.state();

        Self {
            name: event.resource().name().to_string(),
            resource_type: snapshot.resource_type().to_string(),
            uid: event.instance_id().to_string(),
            state: state.map(|s| s.text.clone()).unwrap_or_default(),
            state_style: state.and_then(|s| s.style.clone()).unwrap_or_default(),
            health_state: snapshot.health_status().into(),
            created_at: snapshot.creation_timestamp().map(|t| t.0).unwrap_or_default(),
            exit_code: snapshot.exit_code().unwrap_or_default(),
            environment: snapshot
                .environment_variables()
                .iter()
                .map(|env| EnvironmentVariableView {
                    name: env.name.clone(),
                    value: env.value.clone().unwrap_or_default(),
                    is_from_spec: env.is_from_spec,
                })
                .collect(),
            urls: snapshot
                .urls()
                .iter()
                .map(|url| UrlView {
                    name: url.name.clone(),
                    full_url: url.url.clone(),
                    is_internal: url.is_internal,
                })
                .collect(),
            properties: snapshot
                .properties()
                .iter()
                .map(|p| PropertyView {
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
            volumes: snapshot
                .volumes()
                .iter()
                .map(|v| VolumeView {
                    source: v.source.clone().unwrap_or_default(),
                    target: v.target.clone(),
                    mount_type: v.mount_type.clone(),
                    is_read_only: v.is_read_only,
                })
                .collect(),
            commands: snapshot
                .commands()
                .iter()
                .map(|c| CommandView {
                    command_type: c.command_type.clone(),
                    display_name: c.display_name.clone(),
                    icon_name: c.icon_name.clone().unwrap_or_default(),
                    is_highlighted: c.is_highlighted,
                    state: c.state,
                })
                .collect(),
        }
    }
}
