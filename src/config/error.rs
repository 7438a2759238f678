use crate::core::StateType;
use std::fmt;
use thiserror::Error;

/// A structural problem found while importing a machine config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Transition target '{target}' on state '{state_id}' does not resolve to any state")]
    UnknownTarget { state_id: String, target: String },

    #[error("Compound state '{state_id}' has children but no initial state")]
    MissingInitial { state_id: String },

    #[error("Initial state '{initial}' of '{state_id}' is not one of its children")]
    UnknownInitial { state_id: String, initial: String },

    #[error("State id '{id}' is used by more than one state")]
    DuplicateId { id: String },

    #[error("Parallel state '{state_id}' has no regions")]
    EmptyParallel { state_id: String },

    #[error("{state_type} state '{state_id}' cannot have child states")]
    UnexpectedChildren {
        state_id: String,
        state_type: StateType,
    },
}

/// Every problem found in one config, in discovery order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigErrors {
    errors: Vec<ConfigError>,
}

impl ConfigErrors {
    pub(crate) fn new(errors: Vec<ConfigError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigError> {
        self.errors.iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid machine config ({} problems)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
