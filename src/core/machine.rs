//! Machine definitions: a root state node plus the initial context.

use super::node::StateNode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete, immutable machine definition.
///
/// Every operation that "changes" a definition returns a new value; the
/// original is never touched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub root: StateNode,
    /// Initial extended state, passed through untouched
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl MachineDefinition {
    pub fn new(root: StateNode) -> Self {
        Self {
            root,
            context: Value::Null,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Id of the root node.
    pub fn id(&self) -> &str {
        &self.root.id
    }

    /// Find a state anywhere in the tree by its id.
    pub fn find(&self, id: &str) -> Option<&StateNode> {
        crate::query::all_states(&self.root, true).find(|state| state.id == id)
    }
}

impl From<StateNode> for MachineDefinition {
    fn from(root: StateNode) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateKind;
    use serde_json::json;

    #[test]
    fn find_locates_nested_state() {
        let machine = MachineDefinition::new(StateNode::new(
            "m",
            "m",
            StateKind::Compound {
                initial: "a".into(),
                states: vec![StateNode::atomic("m.a", "a")],
            },
        ));
        assert_eq!(machine.id(), "m");
        assert_eq!(machine.find("m.a").map(|s| s.key.as_str()), Some("a"));
        assert!(machine.find("m.zzz").is_none());
    }

    #[test]
    fn context_is_omitted_when_null() {
        let machine = MachineDefinition::new(StateNode::atomic("m", "m"));
        let json = serde_json::to_value(&machine).unwrap();
        assert!(json.get("context").is_none());

        let with_ctx = machine.with_context(json!({"count": 0}));
        let json = serde_json::to_value(&with_ctx).unwrap();
        assert_eq!(json["context"], json!({"count": 0}));
    }
}
