//! Transition definitions and the string-encoded event name conventions.

use super::action::{ActionRef, GuardRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Event type of an always (eventless) transition.
pub const ALWAYS_EVENT: &str = "";

/// Event type of a wildcard transition, matching any event.
pub const WILDCARD_EVENT: &str = "*";

/// Prefix of the event raised when a compound or parallel state completes.
pub const DONE_STATE_PREFIX: &str = "done.state.";

/// Prefix of the event raised when an invocation completes.
pub const DONE_INVOKE_PREFIX: &str = "done.invoke.";

/// Prefix of the event raised when an invocation fails.
pub const ERROR_PLATFORM_PREFIX: &str = "error.platform.";

/// Prefix of absolute state references.
pub const ABSOLUTE_REF_PREFIX: char = '#';

/// `done.state.<state_id>`
pub fn done_state_event(state_id: &str) -> String {
    format!("{DONE_STATE_PREFIX}{state_id}")
}

/// `done.invoke.<invocation_id>`
pub fn done_invoke_event(invocation_id: &str) -> String {
    format!("{DONE_INVOKE_PREFIX}{invocation_id}")
}

/// `error.platform.<invocation_id>`
pub fn error_platform_event(invocation_id: &str) -> String {
    format!("{ERROR_PLATFORM_PREFIX}{invocation_id}")
}

/// Event type the interpreter raises for a delayed transition on `state_id`.
pub fn after_event(delay: &Delay, state_id: &str) -> String {
    format!("xstate.after({delay})#{state_id}")
}

/// `#<state_id>`
pub fn absolute_ref(state_id: &str) -> String {
    format!("{ABSOLUTE_REF_PREFIX}{state_id}")
}

/// Delay of a delayed transition: a literal duration or a named delay.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delay {
    Millis(u64),
    Named(String),
}

impl Delay {
    /// Parse an `after` map key. Numeric keys are durations in milliseconds.
    pub fn from_key(key: &str) -> Self {
        key.parse::<u64>()
            .map(Delay::Millis)
            .unwrap_or_else(|_| Delay::Named(key.to_string()))
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Millis(ms) => write!(f, "{ms}"),
            Delay::Named(name) => f.write_str(name),
        }
    }
}

/// An outgoing transition declared on exactly one source state.
///
/// Targets are stored as resolved absolute state ids. Use
/// [`Transition::target_refs`] for the canonical `#<id>` form.
///
/// # Example
///
/// ```rust
/// use statemap::core::Transition;
///
/// let transition = Transition::new("m.a", "next").with_target(["m.b"]);
/// assert_eq!(transition.target_refs(), vec!["#m.b".to_string()]);
/// assert!(!transition.is_always());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Id of the state declaring this transition
    pub source: String,
    /// `""` for always transitions, `"*"` for wildcard transitions
    pub event_type: String,
    /// Absolute target state ids; empty for targetless transitions
    #[serde(default)]
    pub target: Vec<String>,
    #[serde(default)]
    pub actions: Vec<ActionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cond: Option<GuardRef>,
    /// Present only on delayed transitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
    #[serde(default)]
    pub internal: bool,
    /// State value the machine must be in for the transition to be enabled
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Transition {
    /// Create a targetless, unguarded transition.
    pub fn new(source: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            event_type: event_type.into(),
            target: Vec::new(),
            actions: Vec::new(),
            cond: None,
            delay: None,
            internal: false,
            in_state: None,
            description: None,
            meta: None,
        }
    }

    pub fn with_target<I, T>(mut self, target: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.target = target.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.actions = actions.into_iter().collect();
        self
    }

    pub fn with_cond(mut self, cond: GuardRef) -> Self {
        self.cond = Some(cond);
        self
    }

    pub fn with_delay(mut self, delay: Delay) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Target ids as resolved absolute ids.
    pub fn target_ids(&self) -> &[String] {
        &self.target
    }

    /// Targets in the canonical absolute reference form `#<id>`.
    pub fn target_refs(&self) -> Vec<String> {
        self.target.iter().map(|id| absolute_ref(id)).collect()
    }

    pub fn is_delayed(&self) -> bool {
        self.delay.is_some()
    }

    pub fn is_always(&self) -> bool {
        self.event_type == ALWAYS_EVENT
    }

    pub fn is_wildcard(&self) -> bool {
        self.event_type == WILDCARD_EVENT
    }
}
