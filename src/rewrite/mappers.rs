//! Ready-made mappers for [`map_states`](super::map_states).

use super::map::StatePath;
use super::node::UpdatableNode;
use crate::config::TransitionConfig;
use crate::core::ActionRef;

/// Mapper appending `actions` to the end of every transition's actions.
///
/// # Example
///
/// ```rust
/// use statemap::core::{ActionRef, MachineDefinition, StateNode, Transition};
/// use statemap::query::all_transitions;
/// use statemap::rewrite::{append_actions_to_all_transitions, map_states};
///
/// let machine = MachineDefinition::new(
///     StateNode::atomic("m", "m").with_transitions([Transition::new("m", "ping")]),
/// );
/// let logged = map_states(&machine, append_actions_to_all_transitions([ActionRef::new("log")]));
///
/// let transition = all_transitions(&logged.root).next().unwrap();
/// assert_eq!(transition.actions, vec![ActionRef::new("log")]);
/// ```
pub fn append_actions_to_all_transitions<I>(
    actions: I,
) -> impl FnMut(UpdatableNode, &StatePath) -> UpdatableNode
where
    I: IntoIterator<Item = ActionRef>,
{
    let actions: Vec<ActionRef> = actions.into_iter().collect();
    move |node: UpdatableNode, _path: &StatePath| {
        node.transform_transitions(|mut transition| {
            transition.actions.extend(actions.iter().cloned());
            transition
        })
    }
}

/// Mapper appending the transitions produced by `make` to every node.
///
/// `make` sees the node before the new transitions are added.
pub fn append_transitions<F, I>(mut make: F) -> impl FnMut(UpdatableNode, &StatePath) -> UpdatableNode
where
    F: FnMut(&UpdatableNode, &StatePath) -> I,
    I: IntoIterator<Item = TransitionConfig>,
{
    move |node: UpdatableNode, path: &StatePath| {
        let added = make(&node, path);
        added
            .into_iter()
            .fold(node, UpdatableNode::append_transition)
    }
}

/// Mapper keeping only the transitions for which `keep` returns true.
pub fn filter_transitions<F>(mut keep: F) -> impl FnMut(UpdatableNode, &StatePath) -> UpdatableNode
where
    F: FnMut(&TransitionConfig) -> bool,
{
    move |node: UpdatableNode, _path: &StatePath| {
        let kept: Vec<TransitionConfig> = node
            .get_transitions()
            .into_iter()
            .filter(|transition| keep(transition))
            .collect();
        node.set_transitions(kept)
    }
}
