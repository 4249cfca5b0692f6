//! Core value types carried inside resource snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time. Clocks set before the epoch read as zero.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Health reported by a resource's health checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Unhealthy,
    Degraded,
    Healthy,
}

/// Observable state text of a resource plus an optional display style.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub text: String,
    /// See [`KnownResourceStateStyles`](crate::states::KnownResourceStateStyles).
    pub style: Option<String>,
}

impl ResourceState {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn with_style(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }
}

impl From<&str> for ResourceState {
    fn from(text: &str) -> Self {
        ResourceState::new(text)
    }
}

impl From<String> for ResourceState {
    fn from(text: String) -> Self {
        ResourceState::new(text)
    }
}

/// A named property shown alongside a resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub name: String,
    pub value: serde_json::Value,
}

impl PropertySnapshot {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An environment variable of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariableSnapshot {
    pub name: String,
    pub value: Option<String>,
    /// True if declared on the resource; false if computed or inherited.
    pub is_from_spec: bool,
}

/// A URL exposed by a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSnapshot {
    pub name: String,
    pub url: String,
    pub is_internal: bool,
}

/// A volume mounted into a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSnapshot {
    /// None for anonymous volumes.
    pub source: Option<String>,
    pub target: String,
    /// Mount kind, e.g. "bind" or "volume".
    pub mount_type: String,
    pub is_read_only: bool,
}

/// State of a resource command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandState {
    /// Visible and usable.
    Enabled,
    /// Visible but not usable.
    Disabled,
    Hidden,
}

impl Default for CommandState {
    fn default() -> Self {
        CommandState::Disabled
    }
}

/// A user-invocable command attached to a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    /// Uniquely identifies the command within its resource.
    pub command_type: String,
    pub state: CommandState,
    pub display_name: String,
    pub icon_name: Option<String>,
    pub is_highlighted: bool,
}

impl CommandSnapshot {
    /// Copy of this command with a different state.
    pub fn with_state(&self, state: CommandState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}
