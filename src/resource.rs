//! Resource definitions as seen by the notification store.
//!
//! Resources belong to the application graph. The store only reads them:
//! their name, declared type, an optional initial snapshot and the command
//! annotations used during reconciliation.

use crate::error::BoxError;
use crate::snapshot::Snapshot;
use crate::types::CommandState;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// A logical resource definition.
pub trait Resource: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Declared type name, stamped on the fallback snapshot.
    fn resource_type(&self) -> &str;

    /// Snapshot to start from before the first publish.
    fn initial_snapshot(&self) -> Option<Snapshot> {
        None
    }

    /// Commands in declaration order.
    fn command_annotations(&self) -> &[CommandAnnotation] {
        &[]
    }
}

/// Shared handle to a resource, compared and hashed by identity.
///
/// Two definitions with the same name are still different resources.
#[derive(Clone)]
pub struct ResourceRef(Arc<dyn Resource>);

impl ResourceRef {
    pub fn new(resource: impl Resource + 'static) -> Self {
        ResourceRef(Arc::new(resource))
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl From<Arc<dyn Resource>> for ResourceRef {
    fn from(resource: Arc<dyn Resource>) -> Self {
        ResourceRef(resource)
    }
}

impl Deref for ResourceRef {
    type Target = dyn Resource;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ResourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ResourceRef {}

impl Hash for ResourceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceRef({})", self.0.name())
    }
}

/// Callback that computes a command's state from the latest snapshot.
pub type CommandStateFn =
    dyn Fn(&UpdateCommandStateContext<'_>) -> std::result::Result<CommandState, BoxError>
        + Send
        + Sync;

/// Input handed to a [`CommandStateFn`].
pub struct UpdateCommandStateContext<'a> {
    pub snapshot: &'a Snapshot,
    pub services: &'a ServiceRegistry,
}

/// Declares a command on a resource.
#[derive(Clone)]
pub struct CommandAnnotation {
    command_type: String,
    display_name: String,
    icon_name: Option<String>,
    is_highlighted: bool,
    update_state: Option<Arc<CommandStateFn>>,
}

impl CommandAnnotation {
    /// Declare a command. Without a state callback it is always disabled.
    pub fn new(command_type: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            command_type: command_type.into(),
            display_name: display_name.into(),
            icon_name: None,
            is_highlighted: false,
            update_state: None,
        }
    }

    pub fn with_icon(mut self, icon_name: impl Into<String>) -> Self {
        self.icon_name = Some(icon_name.into());
        self
    }

    /// Show the command prominently.
    pub fn highlighted(mut self) -> Self {
        self.is_highlighted = true;
        self
    }

    /// Compute the command's state from each published snapshot.
    pub fn with_update_state<F>(mut self, update_state: F) -> Self
    where
        F: Fn(&UpdateCommandStateContext<'_>) -> std::result::Result<CommandState, BoxError>
            + Send
            + Sync
            + 'static,
    {
        self.update_state = Some(Arc::new(update_state));
        self
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn icon_name(&self) -> Option<&str> {
        self.icon_name.as_deref()
    }

    pub fn is_highlighted(&self) -> bool {
        self.is_highlighted
    }

    /// Run the state callback. Without one the command is disabled.
    pub fn compute_state(
        &self,
        ctx: &UpdateCommandStateContext<'_>,
    ) -> std::result::Result<CommandState, BoxError> {
        match &self.update_state {
            Some(update_state) => update_state(ctx),
            None => Ok(CommandState::Disabled),
        }
    }
}

impl fmt::Debug for CommandAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandAnnotation")
            .field("command_type", &self.command_type)
            .field("display_name", &self.display_name)
            .field("icon_name", &self.icon_name)
            .field("is_highlighted", &self.is_highlighted)
            .field("has_update_state", &self.update_state.is_some())
            .finish()
    }
}

/// Type-keyed services available to command callbacks.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any previous one of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// The registered service of type `T`, if any.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|service| Arc::clone(service).downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.len())
            .finish()
    }
}

/// A plain [`Resource`] built from its parts.
#[derive(Clone, Debug)]
pub struct ResourceDefinition {
    name: String,
    resource_type: String,
    initial_snapshot: Option<Snapshot>,
    commands: Vec<CommandAnnotation>,
}

impl ResourceDefinition {
    /// A resource with no initial snapshot and no commands.
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            initial_snapshot: None,
            commands: Vec::new(),
        }
    }

    pub fn with_initial_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.initial_snapshot = Some(snapshot);
        self
    }

    pub fn with_command(mut self, command: CommandAnnotation) -> Self {
        self.commands.push(command);
        self
    }

    /// Finish building and wrap in a shared handle.
    pub fn into_ref(self) -> ResourceRef {
        ResourceRef::new(self)
    }
}

impl Resource for ResourceDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn initial_snapshot(&self) -> Option<Snapshot> {
        self.initial_snapshot.clone()
    }

    fn command_annotations(&self) -> &[CommandAnnotation] {
        &self.commands
    }
}
