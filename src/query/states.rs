//! Pre-order enumeration of the state tree.

use crate::core::StateNode;

/// Lazy pre-order iterator over a state subtree.
///
/// Parents are yielded before their children, and siblings in declaration
/// order. Each call to [`all_states`] creates an independent iterator, so
/// traversals can be restarted freely.
#[derive(Clone, Debug)]
pub struct StateIter<'a> {
    stack: Vec<&'a StateNode>,
}

impl<'a> Iterator for StateIter<'a> {
    type Item = &'a StateNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

/// All states of the subtree rooted at `root`, in pre-order.
///
/// With `include_root` false the root itself is skipped and only its
/// proper descendants are yielded.
///
/// # Example
///
/// ```rust
/// use statemap::core::{StateKind, StateNode};
/// use statemap::query::all_states;
///
/// let root = StateNode::new(
///     "m",
///     "m",
///     StateKind::Compound {
///         initial: "a".into(),
///         states: vec![StateNode::atomic("m.a", "a"), StateNode::atomic("m.b", "b")],
///     },
/// );
///
/// let ids: Vec<_> = all_states(&root, true).map(|s| s.id.as_str()).collect();
/// assert_eq!(ids, vec!["m", "m.a", "m.b"]);
///
/// let proper: Vec<_> = all_states(&root, false).map(|s| s.id.as_str()).collect();
/// assert_eq!(proper, vec!["m.a", "m.b"]);
/// ```
pub fn all_states(root: &StateNode, include_root: bool) -> StateIter<'_> {
    let stack = if include_root {
        vec![root]
    } else {
        root.children().iter().rev().collect()
    };
    StateIter { stack }
}

/// All proper states: every descendant of `root`, excluding `root`.
pub fn all_proper_states(root: &StateNode) -> StateIter<'_> {
    all_states(root, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HistoryKind, StateKind};

    fn compound(id: &str, key: &str, initial: &str, states: Vec<StateNode>) -> StateNode {
        StateNode::new(
            id,
            key,
            StateKind::Compound {
                initial: initial.into(),
                states,
            },
        )
    }

    fn tree() -> StateNode {
        compound(
            "m",
            "m",
            "a",
            vec![
                compound(
                    "m.a",
                    "a",
                    "a1",
                    vec![
                        StateNode::atomic("m.a.a1", "a1"),
                        StateNode::new(
                            "m.a.hist",
                            "hist",
                            StateKind::History {
                                history: HistoryKind::Shallow,
                            },
                        ),
                    ],
                ),
                StateNode::new(
                    "m.p",
                    "p",
                    StateKind::Parallel {
                        states: vec![compound(
                            "m.p.r1",
                            "r1",
                            "x",
                            vec![StateNode::atomic("m.p.r1.x", "x")],
                        )],
                    },
                ),
                StateNode::new("m.done", "done", StateKind::Final { done_data: None }),
            ],
        )
    }

    fn ids<'a>(iter: impl Iterator<Item = &'a StateNode>) -> Vec<&'a str> {
        iter.map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn pre_order_visits_parent_before_children() {
        let root = tree();
        assert_eq!(
            ids(all_states(&root, true)),
            vec!["m", "m.a", "m.a.a1", "m.a.hist", "m.p", "m.p.r1", "m.p.r1.x", "m.done"]
        );
    }

    #[test]
    fn excluding_root_yields_proper_states() {
        let root = tree();
        let proper = ids(all_proper_states(&root));
        assert_eq!(proper.len(), 7);
        assert!(!proper.contains(&"m"));
        assert_eq!(proper[0], "m.a");
    }

    #[test]
    fn traversal_is_restartable() {
        let root = tree();
        let first = ids(all_states(&root, true));
        let second = ids(all_states(&root, true));
        assert_eq!(first, second);
    }

    #[test]
    fn leaf_root() {
        let root = StateNode::atomic("only", "only");
        assert_eq!(ids(all_states(&root, true)), vec!["only"]);
        assert!(all_states(&root, false).next().is_none());
    }
}
