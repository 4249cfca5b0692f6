//! Blocking waits for a resource to reach a state.

use crate::error::{NotificationError, Result};
use crate::states::eq_ignore_case;

use super::event::ResourceEvent;
use super::hub::Subscription;

/// Resource names compare case-insensitively, beyond ASCII as well.
fn names_match(expected: &str, event: &ResourceEvent) -> bool {
    eq_ignore_case(event.resource().name(), expected)
}

/// Non-empty state text of the event, if any.
fn state_text(event: &ResourceEvent) -> Option<&str> {
    event.snapshot().state_text().filter(|s| !s.is_empty())
}

/// Consume `subscription` until `resource_name` reports one of
/// `target_states` (ordinal comparison) and return that state.
pub(crate) fn wait_for_states(
    subscription: Subscription,
    resource_name: &str,
    target_states: &[String],
) -> Result<String> {
    for event in subscription {
        if !names_match(resource_name, &event) {
            continue;
        }
        if let Some(state) = state_text(&event) {
            if target_states.iter().any(|t| t == state) {
                return Ok(state.to_string());
            }
        }
    }

    Err(NotificationError::WaitCancelled {
        resource: resource_name.to_string(),
        target_states: target_states.to_vec(),
    })
}

/// Consume `subscription` until an event of `resource_name` with a state
/// satisfies `predicate`, and return that event.
pub(crate) fn wait_for_match<P>(
    subscription: Subscription,
    resource_name: &str,
    mut predicate: P,
) -> Result<ResourceEvent>
where
    P: FnMut(&ResourceEvent) -> bool,
{
    for event in subscription {
        if names_match(resource_name, &event) && state_text(&event).is_some() && predicate(&event) {
            return Ok(event);
        }
    }

    Err(NotificationError::PredicateWaitCancelled {
        resource: resource_name.to_string(),
    })
}
