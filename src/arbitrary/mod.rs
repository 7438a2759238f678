//! Random machine definitions for property tests.
//!
//! [`arbitrary_machine`] draws a tree shape, gives every state a unique id,
//! then layers transitions, invocations, initial states and done data onto
//! each state. Alongside the machine it reports every state, event, action,
//! condition and service name it embedded, so tests can check the query
//! functions against an independent ground truth.
//!
//! Enabled by the default `arbitrary` feature.

mod descriptor;
mod generate;
mod names;

pub use descriptor::{
    machine_descriptor, state_descriptor, StateDescriptor, MAX_CHILDREN, MAX_DEPTH, MAX_REGIONS,
};
pub use generate::{arbitrary_machine, ArbitraryMachine};
pub use names::{
    event_name, is_valid_event_name, is_valid_state_name, plain_name, state_name, NamePool,
};
