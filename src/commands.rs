//! Reconciliation of a snapshot's commands against a resource's annotations.

use crate::error::{NotificationError, Result};
use crate::resource::{CommandAnnotation, ServiceRegistry, UpdateCommandStateContext};
use crate::snapshot::Snapshot;
use crate::types::CommandSnapshot;
use std::sync::Arc;

/// Merge `annotations` into the command list of `snapshot`.
///
/// Each annotation is matched to a command of the previous list by type
/// (first match). Commands appended during this pass are not matched, so
/// duplicate annotations of a new type are each appended.
/// Missing commands are appended in annotation order; existing ones are
/// replaced in place only when their recomputed state differs. Commands with
/// no matching annotation are kept as they are.
///
/// When nothing was added or changed the snapshot's own list is returned, so
/// `Arc::ptr_eq` against `snapshot.commands()` detects a no-op. A failing
/// state callback aborts reconciliation and its error is returned.
pub fn reconcile_commands(
    annotations: &[CommandAnnotation],
    snapshot: &Snapshot,
    services: &ServiceRegistry,
) -> Result<Arc<[CommandSnapshot]>> {
    let previous = snapshot.commands();
    let ctx = UpdateCommandStateContext { snapshot, services };
    let mut builder: Option<Vec<CommandSnapshot>> = None;

    for annotation in annotations {
        let state = annotation
            .compute_state(&ctx)
            .map_err(|source| NotificationError::CommandState {
                command_type: annotation.command_type().to_string(),
                source,
            })?;

        match find_by_type(previous, annotation.command_type()) {
            None => {
                builder
                    .get_or_insert_with(|| previous.to_vec())
                    .push(CommandSnapshot {
                        command_type: annotation.command_type().to_string(),
                        state,
                        display_name: annotation.display_name().to_string(),
                        icon_name: annotation.icon_name().map(str::to_string),
                        is_highlighted: annotation.is_highlighted(),
                    });
            }
            Some(index) if previous[index].state != state => {
                // Appends only go to the tail, so `index` is still valid.
                let commands = builder.get_or_insert_with(|| previous.to_vec());
                commands[index] = previous[index].with_state(state);
            }
            Some(_) => {}
        }
    }

    Ok(match builder {
        Some(commands) => Arc::from(commands),
        None => Arc::clone(previous),
    })
}

fn find_by_type(commands: &[CommandSnapshot], command_type: &str) -> Option<usize> {
    commands.iter().position(|c| c.command_type == command_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommandState;
    use proptest::prelude::*;

    fn command(command_type: &str, state: CommandState) -> CommandSnapshot {
        CommandSnapshot {
            command_type: command_type.to_string(),
            state,
            display_name: command_type.to_uppercase(),
            icon_name: Some(format!("{command_type}-icon")),
            is_highlighted: false,
        }
    }

    fn fixed(command_type: &str, state: CommandState) -> CommandAnnotation {
        CommandAnnotation::new(command_type, command_type.to_uppercase())
            .with_update_state(move |_| Ok(state))
    }

    /// Enabled while the resource is running, disabled otherwise.
    fn running_only(command_type: &str) -> CommandAnnotation {
        CommandAnnotation::new(command_type, command_type.to_uppercase()).with_update_state(
            |ctx| {
                Ok(match ctx.snapshot.state_text() {
                    Some("Running") => CommandState::Enabled,
                    _ => CommandState::Disabled,
                })
            },
        )
    }

    #[test]
    fn test_appends_missing_commands_in_order() {
        let snapshot = Snapshot::new("Project");
        let annotations = vec![
            fixed("start", CommandState::Enabled).with_icon("Play").highlighted(),
            fixed("stop", CommandState::Hidden),
        ];

        let commands =
            reconcile_commands(&annotations, &snapshot, &ServiceRegistry::new()).unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command_type, "start");
        assert_eq!(commands[0].state, CommandState::Enabled);
        assert_eq!(commands[0].icon_name.as_deref(), Some("Play"));
        assert!(commands[0].is_highlighted);
        assert_eq!(commands[1].command_type, "stop");
        assert_eq!(commands[1].state, CommandState::Hidden);
    }

    #[test]
    fn test_unchanged_returns_same_list() {
        let services = ServiceRegistry::new();
        let annotations = vec![running_only("restart"), fixed("logs", CommandState::Enabled)];
        let snapshot = Snapshot::new("Container").with_state("Running");

        let first = reconcile_commands(&annotations, &snapshot, &services).unwrap();
        let snapshot = snapshot.with_commands(first);

        let second = reconcile_commands(&annotations, &snapshot, &services).unwrap();
        assert!(Arc::ptr_eq(&second, snapshot.commands()));

        let third = reconcile_commands(&annotations, &snapshot, &services).unwrap();
        assert!(Arc::ptr_eq(&third, &second));
    }

    #[test]
    fn test_only_changed_command_is_replaced() {
        let snapshot = Snapshot::new("Container")
            .with_state("Running")
            .with_commands(vec![
                command("logs", CommandState::Enabled),
                command("restart", CommandState::Disabled),
                command("custom", CommandState::Hidden),
            ]);
        let annotations = vec![fixed("logs", CommandState::Enabled), running_only("restart")];

        let commands =
            reconcile_commands(&annotations, &snapshot, &ServiceRegistry::new()).unwrap();

        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], snapshot.commands()[0]);
        assert_eq!(commands[1], command("restart", CommandState::Enabled));
        assert_eq!(commands[2], snapshot.commands()[2]);
        // The input list is not touched.
        assert_eq!(snapshot.commands()[1].state, CommandState::Disabled);
    }

    #[test]
    fn test_duplicate_types_match_first() {
        let snapshot = Snapshot::new("Project").with_commands(vec![
            command("stop", CommandState::Disabled),
            command("stop", CommandState::Disabled),
        ]);
        let annotations = vec![fixed("stop", CommandState::Enabled)];

        let commands =
            reconcile_commands(&annotations, &snapshot, &ServiceRegistry::new()).unwrap();

        assert_eq!(commands[0].state, CommandState::Enabled);
        assert_eq!(commands[1].state, CommandState::Disabled);
    }

    #[test]
    fn test_duplicate_new_annotations_are_each_appended() {
        let annotations = vec![
            fixed("stop", CommandState::Enabled),
            fixed("stop", CommandState::Hidden),
        ];

        let commands =
            reconcile_commands(&annotations, &Snapshot::new("Project"), &ServiceRegistry::new())
                .unwrap();

        let states: Vec<_> = commands.iter().map(|c| (c.command_type.as_str(), c.state)).collect();
        assert_eq!(
            states,
            vec![("stop", CommandState::Enabled), ("stop", CommandState::Hidden)]
        );
    }

    #[test]
    fn test_callback_sees_services() {
        struct Feature(bool);

        let mut services = ServiceRegistry::new();
        services.insert(Feature(true));

        let annotations = vec![CommandAnnotation::new("debug", "Debug").with_update_state(|ctx| {
            Ok(match ctx.services.get::<Feature>() {
                Some(feature) if feature.0 => CommandState::Enabled,
                _ => CommandState::Hidden,
            })
        })];

        let commands =
            reconcile_commands(&annotations, &Snapshot::new("Project"), &services).unwrap();
        assert_eq!(commands[0].state, CommandState::Enabled);
    }

    #[test]
    fn test_callback_failure_propagates() {
        let annotations = vec![
            fixed("start", CommandState::Enabled),
            CommandAnnotation::new("broken", "Broken").with_update_state(|_| Err("no data".into())),
        ];

        let err = reconcile_commands(&annotations, &Snapshot::new("Project"), &ServiceRegistry::new())
            .unwrap_err();

        match err {
            NotificationError::CommandState { command_type, source } => {
                assert_eq!(command_type, "broken");
                assert_eq!(source.to_string(), "no data");
            }
            other => panic!("Expected CommandState error, got {:?}", other),
        }
    }

    fn state_strategy() -> impl Strategy<Value = CommandState> {
        prop_oneof![
            Just(CommandState::Enabled),
            Just(CommandState::Disabled),
            Just(CommandState::Hidden),
        ]
    }

    proptest! {
        #[test]
        fn prop_changes_exactly_the_differing_states(
            pairs in proptest::collection::vec((state_strategy(), state_strategy()), 0..8)
        ) {
            let existing: Vec<CommandSnapshot> = pairs
                .iter()
                .enumerate()
                .map(|(i, (old, _))| command(&format!("cmd{i}"), *old))
                .collect();
            let annotations: Vec<CommandAnnotation> = pairs
                .iter()
                .enumerate()
                .map(|(i, (_, new))| fixed(&format!("cmd{i}"), *new))
                .collect();
            let snapshot = Snapshot::new("Project").with_commands(existing);

            let commands = reconcile_commands(&annotations, &snapshot, &ServiceRegistry::new()).unwrap();

            let any_changed = pairs.iter().any(|(old, new)| old != new);
            prop_assert_eq!(!any_changed, Arc::ptr_eq(&commands, snapshot.commands()));
            prop_assert_eq!(commands.len(), pairs.len());
            for (i, (_, new)) in pairs.iter().enumerate() {
                let before = &snapshot.commands()[i];
                prop_assert_eq!(commands[i].state, *new);
                prop_assert_eq!(&commands[i].display_name, &before.display_name);
                prop_assert_eq!(&commands[i].icon_name, &before.icon_name);
            }
        }
    }
}
