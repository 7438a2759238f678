//! Properties of the ready-made mappers over random machines.

use proptest::prelude::*;
use statemap::arbitrary::{arbitrary_machine, plain_name};
use statemap::config::TransitionConfig;
use statemap::core::{absolute_ref, ActionRef};
use statemap::query::{all_states, all_transitions};
use statemap::rewrite::{
    append_actions_to_all_transitions, append_transitions, filter_transitions, map_states,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn appended_actions_end_every_transition(
        generated in arbitrary_machine(),
        names in prop::collection::vec(plain_name(), 1..=3),
    ) {
        let actions: Vec<ActionRef> = names.iter().map(ActionRef::new).collect();
        let mapped = map_states(
            &generated.machine,
            append_actions_to_all_transitions(actions.clone()),
        );

        let before: Vec<_> = all_transitions(&generated.machine.root).collect();
        let after: Vec<_> = all_transitions(&mapped.root).collect();
        prop_assert_eq!(before.len(), after.len());
        for (original, logged) in before.iter().zip(&after) {
            prop_assert_eq!(&logged.actions[..original.actions.len()], &original.actions[..]);
            prop_assert_eq!(&logged.actions[original.actions.len()..], &actions[..]);
            prop_assert_eq!(&logged.event_type, &original.event_type);
            prop_assert_eq!(&logged.target, &original.target);
        }
    }

    #[test]
    fn rejecting_filter_leaves_no_transitions(generated in arbitrary_machine()) {
        let mapped = map_states(&generated.machine, filter_transitions(|_| false));
        prop_assert_eq!(all_transitions(&mapped.root).count(), 0);
    }

    #[test]
    fn accepting_filter_keeps_every_transition(generated in arbitrary_machine()) {
        let mapped = map_states(&generated.machine, filter_transitions(|_| true));
        let before: Vec<_> = all_transitions(&generated.machine.root).collect();
        let after: Vec<_> = all_transitions(&mapped.root).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn appended_self_loops_point_at_their_source(generated in arbitrary_machine()) {
        let mapped = map_states(
            &generated.machine,
            append_transitions(|node, _path| {
                [TransitionConfig::to([absolute_ref(node.id())]).on_event("refresh")]
            }),
        );

        let states = all_states(&mapped.root, true).count();
        let loops: Vec<_> = all_transitions(&mapped.root)
            .filter(|t| t.event_type == "refresh")
            .collect();
        prop_assert!(loops.len() >= states);
        for state in all_states(&mapped.root, true) {
            let last = state.transitions.last();
            prop_assert_eq!(last.map(|t| &t.target), Some(&vec![state.id.clone()]));
        }
    }
}
