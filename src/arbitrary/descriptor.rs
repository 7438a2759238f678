//! Random tree shapes, before ids or transitions are assigned.

use super::names::state_name;
use crate::core::StateType;
use proptest::collection::vec;
use proptest::prelude::*;

/// Maximum nesting below the root.
pub const MAX_DEPTH: u32 = 3;
/// Maximum children of a compound state.
pub const MAX_CHILDREN: usize = 5;
/// Maximum regions of a parallel state.
pub const MAX_REGIONS: usize = 4;

/// Shape of one state: its kind, a suggested name and its children.
///
/// Compound states and parallel regions always have at least one child,
/// and every parallel region is compound.
#[derive(Clone, Debug, PartialEq)]
pub struct StateDescriptor {
    pub state_type: StateType,
    pub name: String,
    pub children: Vec<StateDescriptor>,
}

impl StateDescriptor {
    pub fn leaf(state_type: StateType, name: String) -> Self {
        Self {
            state_type,
            name,
            children: Vec::new(),
        }
    }

    /// Number of states in this subtree, itself included.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(StateDescriptor::size).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

fn leaf(state_type: StateType) -> impl Strategy<Value = StateDescriptor> {
    state_name().prop_map(move |name| StateDescriptor::leaf(state_type, name))
}

fn compound(inner: BoxedStrategy<StateDescriptor>) -> BoxedStrategy<StateDescriptor> {
    (state_name(), vec(inner, 1..=MAX_CHILDREN))
        .prop_map(|(name, children)| StateDescriptor {
            state_type: StateType::Compound,
            name,
            children,
        })
        .boxed()
}

/// Any nested state: one of the five kinds, at most [`MAX_DEPTH`] deep.
pub fn state_descriptor() -> BoxedStrategy<StateDescriptor> {
    let leaves = prop_oneof![
        leaf(StateType::Atomic),
        leaf(StateType::Final),
        leaf(StateType::History),
    ];

    leaves
        .prop_recursive(MAX_DEPTH, 48, MAX_CHILDREN as u32, |inner| {
            let region = compound(inner.clone());
            prop_oneof![
                compound(inner),
                (state_name(), vec(region, 1..=MAX_REGIONS)).prop_map(|(name, children)| {
                    StateDescriptor {
                        state_type: StateType::Parallel,
                        name,
                        children,
                    }
                }),
            ]
        })
        .boxed()
}

/// A machine root: atomic, compound or parallel.
pub fn machine_descriptor() -> BoxedStrategy<StateDescriptor> {
    state_descriptor()
        .prop_map(|mut root| {
            if matches!(root.state_type, StateType::Final | StateType::History) {
                root.state_type = StateType::Atomic;
            }
            root
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_regions(descriptor: &StateDescriptor) -> bool {
        let own = match descriptor.state_type {
            StateType::Compound => {
                !descriptor.children.is_empty() && descriptor.children.len() <= MAX_CHILDREN
            }
            StateType::Parallel => {
                !descriptor.children.is_empty()
                    && descriptor.children.len() <= MAX_REGIONS
                    && descriptor
                        .children
                        .iter()
                        .all(|region| region.state_type == StateType::Compound)
            }
            _ => descriptor.children.is_empty(),
        };
        own && descriptor.children.iter().all(check_regions)
    }

    proptest! {
        #[test]
        fn shapes_respect_bounds(descriptor in machine_descriptor()) {
            prop_assert!(matches!(
                descriptor.state_type,
                StateType::Atomic | StateType::Compound | StateType::Parallel
            ));
            prop_assert!(check_regions(&descriptor));
            // a parallel level adds one extra level for its regions
            prop_assert!(descriptor.depth() <= 2 * MAX_DEPTH as usize);
        }
    }
}
