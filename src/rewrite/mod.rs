//! Rewriting machine definitions state by state.
//!
//! [`map_states`] walks a definition in pre-order and hands each state to a
//! mapper as an [`UpdatableNode`]. The mapper records changes through the
//! node's consuming mutators and returns it; the engine then materializes
//! the result and attaches children.
//!
//! Transitions in the rewriter always use absolute `#id` targets, since the
//! hierarchy a relative target was written against may no longer exist.
//!
//! The rewriter never fails. It does not validate its output; use
//! [`MachineDefinition::from_config`](crate::core::MachineDefinition::from_config)
//! on the exported config for that.

mod map;
mod mappers;
mod node;

pub use map::{map_state_tree, map_states, StatePath};
pub use mappers::{append_actions_to_all_transitions, append_transitions, filter_transitions};
pub use node::UpdatableNode;
