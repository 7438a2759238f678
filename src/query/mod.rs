//! Read-only queries over machine definitions.
//!
//! - Pre-order state enumeration
//! - Machine-wide aggregation of transitions, actions, conditions and invocations
//! - Classification of transitions into semantic categories
//!
//! All queries are pure and borrow from the definition they inspect.

mod aggregate;
mod categorize;
mod states;

pub use aggregate::{all_actions, all_conditions, all_invocations, all_transitions};
pub use categorize::{
    categorize, categorize_transitions, is_always_transition, is_delayed_transition,
    is_event_transition, is_invocation_done_transition, is_invocation_error_transition,
    is_state_done_transition, is_wildcard_transition, InvocationTransition, StateDoneTransition,
    TransitionCategory, TransitionsByCategory,
};
pub use states::{all_proper_states, all_states, StateIter};
