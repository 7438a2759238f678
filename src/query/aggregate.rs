//! Machine-wide aggregations over the state tree.
//!
//! Every aggregation walks [`all_states`] with the root included and keeps
//! declaration order. Nothing is deduplicated: a repeated declaration shows
//! up repeatedly.

use super::states::all_states;
use crate::core::{ActionRef, GuardRef, Invocation, StateNode, Transition};

/// Every transition declared anywhere in the tree, state by state in
/// pre-order, keeping each state's own order.
pub fn all_transitions(root: &StateNode) -> impl Iterator<Item = &Transition> + '_ {
    all_states(root, true).flat_map(|state| state.transitions.iter())
}

/// Every action in the tree.
///
/// For each state: entry actions, then exit actions, then the actions of
/// each of its transitions in transition order.
pub fn all_actions(root: &StateNode) -> impl Iterator<Item = &ActionRef> + '_ {
    all_states(root, true).flat_map(|state| {
        state
            .entry
            .iter()
            .chain(state.exit.iter())
            .chain(state.transitions.iter().flat_map(|t| t.actions.iter()))
    })
}

/// The guard of every guarded transition, in transition order.
pub fn all_conditions(root: &StateNode) -> impl Iterator<Item = &GuardRef> + '_ {
    all_transitions(root).filter_map(|transition| transition.cond.as_ref())
}

/// Every invocation declared anywhere in the tree.
pub fn all_invocations(root: &StateNode) -> impl Iterator<Item = &Invocation> + '_ {
    all_states(root, true).flat_map(|state| state.invoke.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateKind;

    fn machine() -> StateNode {
        let a = StateNode::atomic("m.a", "a")
            .with_entry([ActionRef::new("enterA")])
            .with_exit([ActionRef::new("exitA")])
            .with_transitions([
                Transition::new("m.a", "go")
                    .with_target(["m.b"])
                    .with_actions([ActionRef::new("t1"), ActionRef::new("t2")])
                    .with_cond(GuardRef::new("ready")),
                Transition::new("m.a", "stay").with_actions([ActionRef::new("t3")]),
            ])
            .with_invoke([Invocation::new("svc", "fetch")]);
        let b = StateNode::atomic("m.b", "b")
            .with_entry([ActionRef::new("enterA")])
            .with_transitions([Transition::new("m.b", "")
                .with_target(["m.a"])
                .with_cond(GuardRef::new("ready"))]);
        StateNode::new(
            "m",
            "m",
            StateKind::Compound {
                initial: "a".into(),
                states: vec![a, b],
            },
        )
        .with_entry([ActionRef::new("boot")])
        .with_invoke([Invocation::new("root", "watch")])
    }

    #[test]
    fn transitions_in_traversal_order() {
        let root = machine();
        let events: Vec<_> = all_transitions(&root)
            .map(|t| t.event_type.as_str())
            .collect();
        assert_eq!(events, vec!["go", "stay", ""]);
    }

    #[test]
    fn actions_entry_then_exit_then_transitions() {
        let root = machine();
        let actions: Vec<_> = all_actions(&root)
            .map(|a| a.action_type.as_str())
            .collect();
        assert_eq!(
            actions,
            vec!["boot", "enterA", "exitA", "t1", "t2", "t3", "enterA"]
        );
    }

    #[test]
    fn conditions_keep_duplicates() {
        let root = machine();
        let conds: Vec<_> = all_conditions(&root).map(|c| c.name.as_str()).collect();
        assert_eq!(conds, vec!["ready", "ready"]);
    }

    #[test]
    fn invocations_include_root() {
        let root = machine();
        let ids: Vec<_> = all_invocations(&root).map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "svc"]);
    }
}
