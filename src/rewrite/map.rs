//! Pre-order rewriting of a whole state tree.

use super::node::{Materialized, UpdatableNode};
use crate::config::build_children;
use crate::core::{MachineDefinition, StateKind, StateNode};
use tracing::{debug, warn};

/// Transformed ancestors of the node being mapped, root first, immediate
/// parent last. Each entry has its children stripped. Empty at the root.
pub type StatePath = [StateNode];

/// Build a new definition by passing every state through `mapper`.
///
/// States are visited in pre-order: a parent is mapped before any of its
/// children, and each child sees the already-transformed ancestors in its
/// path. The original definition is left untouched.
///
/// Children are attached as follows:
/// - original children are mapped recursively, in order, each exactly once
/// - children declared with [`UpdatableNode::set_child_states`] are built
///   under the mapped node, replacing the mapped original child with the
///   same key in place and otherwise appended; they are not mapped themselves
/// - an atomic node that ends up with children becomes compound, starting
///   at the pending initial key or else its first child
///
/// # Example
///
/// ```rust
/// use statemap::config::MachineConfig;
/// use statemap::core::MachineDefinition;
/// use statemap::query::all_invocations;
/// use statemap::rewrite::map_states;
///
/// let config: MachineConfig = serde_json::from_str(
///     r#"{"id": "m", "initial": "a", "states": {"a": {"invoke": {"src": "poll"}}, "b": {}}}"#,
/// )
/// .unwrap();
/// let machine = MachineDefinition::from_config(&config).unwrap();
///
/// let stripped = map_states(&machine, |node, _path| node.clear_invocations());
///
/// assert_eq!(all_invocations(&stripped.root).count(), 0);
/// assert_eq!(all_invocations(&machine.root).count(), 1);
/// ```
pub fn map_states<F>(machine: &MachineDefinition, mapper: F) -> MachineDefinition
where
    F: FnMut(UpdatableNode, &StatePath) -> UpdatableNode,
{
    MachineDefinition {
        root: map_state_tree(&machine.root, mapper),
        context: machine.context.clone(),
    }
}

/// Rewrite the subtree rooted at `root`. The root is mapped with an empty
/// path.
pub fn map_state_tree<F>(root: &StateNode, mut mapper: F) -> StateNode
where
    F: FnMut(UpdatableNode, &StatePath) -> UpdatableNode,
{
    let mut path = Vec::new();
    map_node(root, &mut path, &mut mapper)
}

fn map_node<F>(original: &StateNode, path: &mut Vec<StateNode>, mapper: &mut F) -> StateNode
where
    F: FnMut(UpdatableNode, &StatePath) -> UpdatableNode,
{
    debug!(state_id = %original.id, depth = path.len(), "Mapping state");

    let Materialized {
        node,
        initial,
        child_states,
    } = mapper(UpdatableNode::new(original), path.as_slice()).materialize();
    let mut declared = child_states
        .map(|states| build_children(&node.id, &states))
        .unwrap_or_default();

    path.push(node.clone());
    let mut children: Vec<StateNode> = Vec::with_capacity(original.children().len());
    for child in original.children() {
        let mapped = map_node(child, path, mapper);
        children.push(declared.shift_remove(&child.key).unwrap_or(mapped));
    }
    path.pop();
    children.extend(declared.into_values());

    attach_children(node, initial, children)
}

fn attach_children(mut node: StateNode, initial: Option<String>, children: Vec<StateNode>) -> StateNode {
    node.kind = match node.kind {
        StateKind::Compound { initial, .. } => StateKind::Compound {
            initial,
            states: children,
        },
        StateKind::Parallel { .. } => StateKind::Parallel { states: children },
        StateKind::Atomic if !children.is_empty() => {
            let initial = initial
                .or_else(|| children.first().map(|child| child.key.clone()))
                .unwrap_or_default();
            debug!(state_id = %node.id, %initial, "Atomic state with children promoted to compound");
            StateKind::Compound {
                initial,
                states: children,
            }
        }
        leaf => {
            if !children.is_empty() {
                warn!(
                    state_id = %node.id,
                    state_type = %leaf.state_type(),
                    dropped = children.len(),
                    "State type cannot hold children, dropping them"
                );
            }
            leaf
        }
    };
    node
}
