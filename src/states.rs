//! Well-known resource state texts and display styles.

/// State texts shared by the built-in resource kinds.
pub struct KnownResourceStates;

impl KnownResourceStates {
    pub const HIDDEN: &'static str = "Hidden";
    pub const STARTING: &'static str = "Starting";
    pub const RUNNING: &'static str = "Running";
    /// The resource never managed to start.
    pub const FAILED_TO_START: &'static str = "FailedToStart";
    pub const STOPPING: &'static str = "Stopping";
    pub const EXITED: &'static str = "Exited";
    pub const FINISHED: &'static str = "Finished";
    /// Blocked on a dependency.
    pub const WAITING: &'static str = "Waiting";

    /// States a resource does not leave on its own.
    pub const TERMINAL_STATES: [&'static str; 3] =
        [Self::FINISHED, Self::FAILED_TO_START, Self::EXITED];

    pub fn is_terminal(state: &str) -> bool {
        Self::TERMINAL_STATES.contains(&state)
    }
}

/// Case-insensitive comparison of resource names and state texts.
///
/// Folds every character through its Unicode uppercase mapping, so
/// `"überwacher"` matches `"ÜBERWACHER"`.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_uppercase)
        .eq(b.chars().flat_map(char::to_uppercase))
}

/// Display styles attached to a state text.
pub struct KnownResourceStateStyles;

impl KnownResourceStateStyles {
    pub const SUCCESS: &'static str = "success";
    pub const ERROR: &'static str = "error";
    pub const INFO: &'static str = "info";
    pub const WARN: &'static str = "warn";
}
