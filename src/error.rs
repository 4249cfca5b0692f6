//! Error types for resource notifications.

use thiserror::Error;

/// Boxed error produced by caller-supplied transforms and command callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for notification operations.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Snapshot transform failed: {0}")]
    Transform(#[source] BoxError),

    #[error("Command state computation failed for '{command_type}': {source}")]
    CommandState {
        command_type: String,
        #[source]
        source: BoxError,
    },

    #[error(
        "Wait for resource '{resource}' was cancelled before it reached one of the target states: [{}]",
        .target_states.join(", ")
    )]
    WaitCancelled {
        resource: String,
        target_states: Vec<String>,
    },

    #[error("Wait for resource '{resource}' was cancelled before it met the predicate condition")]
    PredicateWaitCancelled { resource: String },
}

impl NotificationError {
    /// Wrap a failure raised inside a snapshot transform.
    pub fn transform(err: impl Into<BoxError>) -> Self {
        NotificationError::Transform(err.into())
    }

    /// True for the errors a wait returns when its token or the shutdown
    /// signal fired first.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            NotificationError::WaitCancelled { .. } | NotificationError::PredicateWaitCancelled { .. }
        )
    }
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotificationError>;
