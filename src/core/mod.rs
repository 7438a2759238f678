//! Data model for hierarchical machine definitions.
//!
//! This module contains the immutable definition types shared by every
//! other part of the crate:
//! - State nodes and their variants
//! - Transitions and the event naming conventions they rely on
//! - Action, guard and invocation references
//!
//! Nothing here executes a machine. Definitions are plain data.

mod action;
mod machine;
mod node;
mod transition;

pub use action::{ActionRef, GuardRef, Invocation};
pub use machine::MachineDefinition;
pub use node::{DoneData, HistoryKind, StateKind, StateNode, StateType};
pub use transition::{
    absolute_ref, after_event, done_invoke_event, done_state_event, error_platform_event, Delay,
    Transition, ABSOLUTE_REF_PREFIX, ALWAYS_EVENT, DONE_INVOKE_PREFIX, DONE_STATE_PREFIX,
    ERROR_PLATFORM_PREFIX, WILDCARD_EVENT,
};
