//! JSON configuration interop.
//!
//! Machine definitions are usually authored as nested config objects. This
//! module covers both directions:
//! - [`MachineDefinition::from_config`] assigns ids, infers state types and
//!   resolves relative targets, reporting every problem at once
//! - [`MachineDefinition::to_config`] renders the canonical long form
//!
//! [`TransitionConfig`] is also the structured transition form used by the
//! rewriter.
//!
//! [`MachineDefinition::from_config`]: crate::core::MachineDefinition::from_config
//! [`MachineDefinition::to_config`]: crate::core::MachineDefinition::to_config

mod error;
mod export;
mod import;
mod types;

pub use error::{ConfigError, ConfigErrors};
pub use export::transition_config;
pub use import::DEFAULT_MACHINE_ID;
pub use types::{InvokeConfig, MachineConfig, StateNodeConfig, TransitionConfig, TransitionList};

pub(crate) use import::build_children;
