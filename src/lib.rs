//! Statemap: traversal and rewriting of hierarchical state machine definitions
//!
//! Statemap treats a statechart definition as plain, immutable data. It does
//! not run machines; it answers questions about them and produces new ones.
//!
//! # Modules
//!
//! - [`core`]: state nodes, transitions and the event naming conventions
//! - [`query`]: pre-order state enumeration, machine-wide aggregation and
//!   transition classification
//! - [`rewrite`]: visit every state with its ancestor path and build a
//!   modified definition
//! - [`config`]: import from and export to the nested JSON config format
//! - `arbitrary`: proptest strategies for random machines (default feature)
//!
//! # Example
//!
//! ```rust
//! use statemap::config::MachineConfig;
//! use statemap::core::MachineDefinition;
//! use statemap::query::{all_states, categorize_transitions, all_transitions};
//! use statemap::rewrite::map_states;
//!
//! let config: MachineConfig = serde_json::from_str(
//!     r#"{"id": "m", "initial": "a", "states": {
//!         "a": {"on": {"next": "b"}, "invoke": {"src": "poll"}},
//!         "b": {"type": "final"}
//!     }}"#,
//! )
//! .unwrap();
//! let machine = MachineDefinition::from_config(&config).unwrap();
//!
//! let ids: Vec<_> = all_states(&machine.root, true).map(|s| s.id.as_str()).collect();
//! assert_eq!(ids, vec!["m", "m.a", "m.b"]);
//!
//! let categories = categorize_transitions(all_transitions(&machine.root));
//! assert_eq!(categories.event_occurred.len(), 1);
//!
//! let stripped = map_states(&machine, |node, _path| node.clear_invocations());
//! assert!(stripped.find("m.a").unwrap().invoke.is_empty());
//! ```

pub mod config;
pub mod core;
pub mod query;
pub mod rewrite;

#[cfg(feature = "arbitrary")]
pub mod arbitrary;

// Re-export commonly used types
pub use config::{MachineConfig, StateNodeConfig, TransitionConfig};
pub use core::{MachineDefinition, StateKind, StateNode, StateType, Transition};
pub use query::{all_states, all_transitions, categorize_transitions, TransitionCategory};
pub use rewrite::{map_states, UpdatableNode};
