//! Named references to actions, guards and invoked services.
//!
//! Definitions never carry executable behavior for these. They only name
//! the implementation the interpreting library looks up at runtime, plus
//! optional opaque parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to an action executed on entry, exit or when a transition is taken.
///
/// # Example
///
/// ```rust
/// use statemap::core::ActionRef;
///
/// let action = ActionRef::new("notify");
/// assert_eq!(action.action_type, "notify");
/// assert!(action.params.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Name of the action implementation
    #[serde(rename = "type")]
    pub action_type: String,
    /// Remaining fields of the action object, passed through untouched
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionRef {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            params: Map::new(),
        }
    }

    pub fn with_params(action_type: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            action_type: action_type.into(),
            params,
        }
    }
}

/// Reference to a guard condition. A transition without one is unconditional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardRef {
    /// Name of the guard implementation
    #[serde(rename = "type")]
    pub name: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl GuardRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }
}

/// A service invoked while its owning state is active.
///
/// Completion and failure are handled by transitions on the owning state
/// listening for `done.invoke.<id>` and `error.platform.<id>`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    /// Invocation id, used in completion and error event names
    pub id: String,
    /// Name of the service implementation
    pub src: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_forward: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Invocation {
    pub fn new(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            auto_forward: false,
            meta: None,
        }
    }
}
