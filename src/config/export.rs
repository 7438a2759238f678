//! Rendering definitions back into configs.
//!
//! The output uses explicit ids and absolute `#id` targets everywhere, so it
//! imports back to the same definition regardless of how the original config
//! spelled its references.

use super::types::{InvokeConfig, MachineConfig, StateNodeConfig, TransitionConfig};
use crate::core::{after_event, MachineDefinition, StateKind, StateNode, Transition};
use indexmap::IndexMap;

impl MachineDefinition {
    /// Render this definition as a machine config.
    pub fn to_config(&self) -> MachineConfig {
        MachineConfig {
            root: self.root.to_config(),
            context: self.context.clone(),
        }
    }
}

impl StateNode {
    /// Render this node and its subtree as a state config.
    ///
    /// Delayed transitions whose event is the interpreter's own delay event
    /// go under `after`; always transitions go under `always`; everything
    /// else, completion and error events included, goes under `on`.
    pub fn to_config(&self) -> StateNodeConfig {
        let mut config = StateNodeConfig {
            state_type: Some(self.state_type()),
            id: Some(self.id.clone()),
            invoke: self.invoke.iter().map(invoke_config).collect(),
            entry: self.entry.clone(),
            exit: self.exit.clone(),
            tags: self.tags.clone(),
            meta: self.meta.clone(),
            description: self.description.clone(),
            ..StateNodeConfig::default()
        };

        match &self.kind {
            StateKind::Compound { initial, states } => {
                config.initial = Some(initial.clone());
                config.states = children_config(states);
            }
            StateKind::Parallel { states } => config.states = children_config(states),
            StateKind::Final { done_data } => config.data = done_data.clone(),
            StateKind::History { history } => config.history = Some(*history),
            StateKind::Atomic => {}
        }

        for transition in &self.transitions {
            let mut structured = transition_config(transition);
            structured.event = None;

            match &transition.delay {
                Some(delay) if transition.event_type == after_event(delay, &self.id) => {
                    structured.delay = None;
                    config
                        .after
                        .entry(delay.to_string())
                        .or_default()
                        .0
                        .push(structured);
                }
                None if transition.is_always() => config.always.0.push(structured),
                _ => config
                    .on
                    .entry(transition.event_type.clone())
                    .or_default()
                    .0
                    .push(structured),
            }
        }

        config
    }
}

fn children_config(states: &[StateNode]) -> IndexMap<String, StateNodeConfig> {
    states
        .iter()
        .map(|child| (child.key.clone(), child.to_config()))
        .collect()
}

fn invoke_config(invocation: &crate::core::Invocation) -> InvokeConfig {
    InvokeConfig {
        id: Some(invocation.id.clone()),
        src: invocation.src.clone(),
        auto_forward: invocation.auto_forward,
        meta: invocation.meta.clone(),
        ..InvokeConfig::default()
    }
}

/// Structured form of a transition, with its event and absolute target refs.
///
/// `internal` is only written when it differs from what import infers for
/// absolute targets.
pub fn transition_config(transition: &Transition) -> TransitionConfig {
    TransitionConfig {
        event: Some(transition.event_type.clone()),
        target: transition.target_refs(),
        actions: transition.actions.clone(),
        cond: transition.cond.clone(),
        delay: transition.delay.clone(),
        internal: (transition.internal != transition.target.is_empty())
            .then_some(transition.internal),
        in_state: transition.in_state.clone(),
        description: transition.description.clone(),
        meta: transition.meta.clone(),
    }
}
