//! Name strategies and the pool that keeps generated state ids unique.

use proptest::prelude::*;
use std::collections::HashSet;

/// Event names that break object-keyed lookups in consuming libraries.
const RESERVED_EVENT_NAMES: [&str; 4] = ["__proto__", "constructor", "valueOf", "toString"];

/// Can `name` be used as a state key?
///
/// Names starting with `#` or `.` would read as target references.
pub fn is_valid_state_name(name: &str) -> bool {
    !name.is_empty() && name != "__proto__" && !name.starts_with('#') && !name.starts_with('.')
}

pub fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty() && !RESERVED_EVENT_NAMES.contains(&name)
}

pub fn state_name() -> impl Strategy<Value = String> {
    "\\PC{1,8}".prop_filter("reserved state name", |name| is_valid_state_name(name))
}

pub fn event_name() -> impl Strategy<Value = String> {
    "\\PC{1,8}".prop_filter("reserved event name", |name| is_valid_event_name(name))
}

/// Action, guard, service and invocation names. May be empty.
pub fn plain_name() -> impl Strategy<Value = String> {
    "\\PC{0,8}"
}

/// State ids claimed so far during one machine build.
///
/// A pool lives for exactly one build, so every shrink attempt starts from
/// an empty pool.
#[derive(Debug, Default)]
pub struct NamePool {
    taken: HashSet<String>,
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name`, suffixing it with a counter if it is already taken.
    pub fn claim(&mut self, name: &str) -> String {
        let mut id = name.to_string();
        let mut suffix = self.taken.len();
        while self.taken.contains(&id) {
            id = format!("{name}{suffix}");
            suffix += 1;
        }
        self.taken.insert(id.clone());
        id
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_name_rules() {
        assert!(is_valid_state_name("idle"));
        assert!(is_valid_state_name("a#b"));
        assert!(!is_valid_state_name(""));
        assert!(!is_valid_state_name("__proto__"));
        assert!(!is_valid_state_name("#idle"));
        assert!(!is_valid_state_name(".idle"));
    }

    #[test]
    fn event_name_rules() {
        assert!(is_valid_event_name("GO"));
        assert!(is_valid_event_name("*"));
        assert!(!is_valid_event_name("constructor"));
        assert!(!is_valid_event_name("toString"));
    }

    #[test]
    fn pool_suffixes_duplicates() {
        let mut pool = NamePool::new();
        assert_eq!(pool.claim("a"), "a");
        assert_eq!(pool.claim("a"), "a1");
        assert_eq!(pool.claim("a1"), "a12");
        assert_eq!(pool.claim("a"), "a3");
        assert_eq!(pool.len(), 4);
    }

    proptest! {
        #[test]
        fn generated_state_names_are_valid(name in state_name()) {
            prop_assert!(is_valid_state_name(&name));
        }

        #[test]
        fn claimed_ids_never_repeat(names in prop::collection::vec("[ab]{1,2}", 1..20)) {
            let mut pool = NamePool::new();
            let ids: Vec<String> = names.iter().map(|n| pool.claim(n)).collect();
            let unique: HashSet<&String> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
        }
    }
}
