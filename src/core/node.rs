//! State nodes: the tree that makes up a machine definition.
//!
//! A node's variant is a sum type serialized with a `"type"` discriminant.
//! Only compound and parallel nodes own children; all traversal and
//! rewriting dispatches on the variant rather than on trait objects.

use super::action::{ActionRef, Invocation};
use super::transition::Transition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Discriminant of [`StateKind`] without the variant payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Atomic,
    Compound,
    Parallel,
    Final,
    History,
}

impl StateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atomic => "atomic",
            Self::Compound => "compound",
            Self::Parallel => "parallel",
            Self::Final => "final",
            Self::History => "history",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a history state recalls only the direct child or the full
/// descendant configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    #[default]
    Shallow,
    Deep,
}

type DoneDataFn = dyn Fn(&Value, &Value) -> Value + Send + Sync;

/// Mapper computing the data of a final state's completion event from
/// `(context, event)`.
///
/// Mappers are compared by identity and are never serialized.
#[derive(Clone)]
pub struct DoneData(Arc<DoneDataFn>);

impl DoneData {
    pub fn new<F>(mapper: F) -> Self
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(mapper))
    }

    /// A mapper that ignores its inputs and always yields `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_, _| value.clone())
    }

    pub fn compute(&self, context: &Value, event: &Value) -> Value {
        (self.0)(context, event)
    }
}

impl fmt::Debug for DoneData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DoneData(..)")
    }
}

impl PartialEq for DoneData {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Variant of a state node together with its variant-specific data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StateKind {
    /// Leaf state
    Atomic,
    /// Exactly one child active at a time, starting at `initial`
    Compound {
        initial: String,
        states: Vec<StateNode>,
    },
    /// All child regions active simultaneously
    Parallel { states: Vec<StateNode> },
    /// Leaf state completing its parent when entered
    Final {
        #[serde(skip)]
        done_data: Option<DoneData>,
    },
    /// Pseudo-state recalling the parent's previously active child
    History {
        #[serde(default)]
        history: HistoryKind,
    },
}

impl StateKind {
    pub fn state_type(&self) -> StateType {
        match self {
            Self::Atomic => StateType::Atomic,
            Self::Compound { .. } => StateType::Compound,
            Self::Parallel { .. } => StateType::Parallel,
            Self::Final { .. } => StateType::Final,
            Self::History { .. } => StateType::History,
        }
    }
}

/// A named node in the state tree.
///
/// `id` is unique within the machine; `key` is unique among siblings.
/// `transitions` holds only the transitions declared on this node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateNode {
    pub id: String,
    pub key: String,
    #[serde(flatten)]
    pub kind: StateKind,
    #[serde(default)]
    pub entry: Vec<ActionRef>,
    #[serde(default)]
    pub exit: Vec<ActionRef>,
    #[serde(default)]
    pub invoke: Vec<Invocation>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StateNode {
    /// Create a node with no actions, invocations, transitions or metadata.
    pub fn new(id: impl Into<String>, key: impl Into<String>, kind: StateKind) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            kind,
            entry: Vec::new(),
            exit: Vec::new(),
            invoke: Vec::new(),
            transitions: Vec::new(),
            tags: Vec::new(),
            meta: None,
            description: None,
        }
    }

    pub fn atomic(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(id, key, StateKind::Atomic)
    }

    pub fn state_type(&self) -> StateType {
        self.kind.state_type()
    }

    /// Direct children in declaration order. Empty for leaf variants.
    pub fn children(&self) -> &[StateNode] {
        match &self.kind {
            StateKind::Compound { states, .. } | StateKind::Parallel { states } => states,
            _ => &[],
        }
    }

    pub fn child(&self, key: &str) -> Option<&StateNode> {
        self.children().iter().find(|child| child.key == key)
    }

    pub fn initial(&self) -> Option<&str> {
        match &self.kind {
            StateKind::Compound { initial, .. } => Some(initial),
            _ => None,
        }
    }

    pub fn history(&self) -> Option<HistoryKind> {
        match &self.kind {
            StateKind::History { history } => Some(*history),
            _ => None,
        }
    }

    pub fn done_data(&self) -> Option<&DoneData> {
        match &self.kind {
            StateKind::Final { done_data } => done_data.as_ref(),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Copy of this node with its children removed, keeping the variant.
    pub fn without_children(&self) -> StateNode {
        let kind = match &self.kind {
            StateKind::Compound { initial, .. } => StateKind::Compound {
                initial: initial.clone(),
                states: Vec::new(),
            },
            StateKind::Parallel { .. } => StateKind::Parallel { states: Vec::new() },
            other => other.clone(),
        };
        StateNode {
            id: self.id.clone(),
            key: self.key.clone(),
            kind,
            entry: self.entry.clone(),
            exit: self.exit.clone(),
            invoke: self.invoke.clone(),
            transitions: self.transitions.clone(),
            tags: self.tags.clone(),
            meta: self.meta.clone(),
            description: self.description.clone(),
        }
    }

    pub fn with_transitions<I>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = Transition>,
    {
        self.transitions = transitions.into_iter().collect();
        self
    }

    pub fn with_entry<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.entry = actions.into_iter().collect();
        self
    }

    pub fn with_exit<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.exit = actions.into_iter().collect();
        self
    }

    pub fn with_invoke<I>(mut self, invocations: I) -> Self
    where
        I: IntoIterator<Item = Invocation>,
    {
        self.invoke = invocations.into_iter().collect();
        self
    }
}
