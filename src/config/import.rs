//! Building machine definitions from configs.
//!
//! Import assigns ids, infers state types and resolves every transition
//! target to an absolute id. Structural problems are collected as
//! `Validation` failures so that a single import reports all of them.

use super::error::{ConfigError, ConfigErrors};
use super::types::{MachineConfig, StateNodeConfig, TransitionConfig, TransitionList};
use crate::core::{
    after_event, done_invoke_event, done_state_event, error_platform_event, Delay, Invocation,
    MachineDefinition, StateKind, StateNode, StateType, Transition, ABSOLUTE_REF_PREFIX,
    ALWAYS_EVENT,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::{debug, warn};

/// Id given to a root state whose config does not name one.
pub const DEFAULT_MACHINE_ID: &str = "(machine)";

type Check = Validation<(), NonEmptyVec<ConfigError>>;

/// What to do with a problem found during import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    /// Record it and fail the import
    Strict,
    /// Log it and keep going with a best-effort node
    Lenient,
}

/// Both-way index between state ids and key paths from the import root.
#[derive(Debug, Default)]
struct Index {
    ids_by_path: HashMap<Vec<String>, String>,
    paths_by_id: HashMap<String, Vec<String>>,
    duplicates: Vec<String>,
}

impl Index {
    fn build(root_id: &str, root: &StateNodeConfig) -> Self {
        let mut index = Index::default();
        index.visit(root_id.to_string(), Vec::new(), root);
        index
    }

    /// Index of `states` declared together under the existing state
    /// `parent_id`, which sits at the empty path.
    fn build_children(parent_id: &str, states: &IndexMap<String, StateNodeConfig>) -> Self {
        let mut index = Index::default();
        index.paths_by_id.insert(parent_id.to_string(), Vec::new());
        index.visit_children(parent_id, &[], states);
        index.ids_by_path.insert(Vec::new(), parent_id.to_string());
        index
    }

    fn visit(&mut self, id: String, path: Vec<String>, config: &StateNodeConfig) {
        if self.paths_by_id.contains_key(&id) {
            self.duplicates.push(id.clone());
        } else {
            self.paths_by_id.insert(id.clone(), path.clone());
        }

        self.visit_children(&id, &path, &config.states);
        self.ids_by_path.insert(path, id);
    }

    fn visit_children(
        &mut self,
        id: &str,
        path: &[String],
        states: &IndexMap<String, StateNodeConfig>,
    ) {
        for (key, child) in states {
            let mut child_path = path.to_vec();
            child_path.push(key.clone());
            self.visit(child_id(id, key, child), child_path, child);
        }
    }

    /// Resolve a target reference written on the state at `source_path`.
    fn resolve(&self, source_path: &[String], target: &str) -> Option<String> {
        let path: Vec<String> = if let Some(reference) = target.strip_prefix(ABSOLUTE_REF_PREFIX)
        {
            if self.paths_by_id.contains_key(reference) {
                return Some(reference.to_string());
            }
            // `#id.child.grandchild`: longest id prefix wins
            let (base, rest) = reference.match_indices('.').rev().find_map(|(at, _)| {
                self.paths_by_id
                    .get(&reference[..at])
                    .map(|base| (base, &reference[at + 1..]))
            })?;
            base.iter().cloned().chain(split_path(rest)).collect()
        } else if let Some(relative) = target.strip_prefix('.') {
            source_path.iter().cloned().chain(split_path(relative)).collect()
        } else {
            let (_, parent) = source_path.split_last()?;
            parent.iter().cloned().chain(split_path(target)).collect()
        };
        self.ids_by_path.get(&path).cloned()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split('.').map(String::from)
}

fn child_id(parent_id: &str, key: &str, config: &StateNodeConfig) -> String {
    config
        .id
        .clone()
        .unwrap_or_else(|| format!("{parent_id}.{key}"))
}

struct Importer {
    index: Index,
    resolution: Resolution,
    checks: Vec<Check>,
}

impl Importer {
    fn new(root_id: &str, root: &StateNodeConfig, resolution: Resolution) -> Self {
        Self::with_index(Index::build(root_id, root), resolution)
    }

    fn with_index(index: Index, resolution: Resolution) -> Self {
        let mut importer = Self {
            index,
            resolution,
            checks: Vec::new(),
        };
        for id in std::mem::take(&mut importer.index.duplicates) {
            importer.report(ConfigError::DuplicateId { id });
        }
        importer
    }

    fn report(&mut self, error: ConfigError) {
        match self.resolution {
            Resolution::Strict => self.checks.push(Validation::fail(error)),
            Resolution::Lenient => warn!(%error, "Ignoring problem in state config"),
        }
    }

    fn finish(self) -> Result<(), ConfigErrors> {
        match Validation::all_vec(self.checks).map(|_| ()) {
            Validation::Success(()) => Ok(()),
            Validation::Failure(errors) => {
                Err(ConfigErrors::new(errors.iter().cloned().collect()))
            }
        }
    }

    fn node(&mut self, id: String, key: &str, path: &[String], config: &StateNodeConfig) -> StateNode {
        let kind = self.kind(&id, path, config);
        let (invoke, transitions) = self.transitions(&id, path, config);

        StateNode {
            id,
            key: key.to_string(),
            kind,
            entry: config.entry.clone(),
            exit: config.exit.clone(),
            invoke,
            transitions,
            tags: config.tags.clone(),
            meta: config.meta.clone(),
            description: config.description.clone(),
        }
    }

    fn children(&mut self, id: &str, path: &[String], config: &StateNodeConfig) -> Vec<StateNode> {
        config
            .states
            .iter()
            .map(|(key, child)| {
                let mut child_path = path.to_vec();
                child_path.push(key.to_string());
                self.node(child_id(id, key, child), key, &child_path, child)
            })
            .collect()
    }

    fn kind(&mut self, id: &str, path: &[String], config: &StateNodeConfig) -> StateKind {
        let has_children = !config.states.is_empty();
        let state_type = config.state_type.unwrap_or(if has_children {
            StateType::Compound
        } else {
            StateType::Atomic
        });

        match state_type {
            StateType::Compound if !has_children => {
                debug!(state_id = id, "Compound state without children imported as atomic");
                StateKind::Atomic
            }
            StateType::Compound => {
                let initial = match &config.initial {
                    Some(initial) if config.states.contains_key(initial) => initial.clone(),
                    Some(initial) => {
                        self.report(ConfigError::UnknownInitial {
                            state_id: id.to_string(),
                            initial: initial.clone(),
                        });
                        initial.clone()
                    }
                    None => {
                        self.report(ConfigError::MissingInitial {
                            state_id: id.to_string(),
                        });
                        config.states.keys().next().cloned().unwrap_or_default()
                    }
                };
                StateKind::Compound {
                    initial,
                    states: self.children(id, path, config),
                }
            }
            StateType::Parallel => {
                if !has_children {
                    self.report(ConfigError::EmptyParallel {
                        state_id: id.to_string(),
                    });
                }
                StateKind::Parallel {
                    states: self.children(id, path, config),
                }
            }
            leaf => {
                if has_children {
                    self.report(ConfigError::UnexpectedChildren {
                        state_id: id.to_string(),
                        state_type: leaf,
                    });
                }
                match leaf {
                    StateType::Final => StateKind::Final {
                        done_data: config.data.clone(),
                    },
                    StateType::History => StateKind::History {
                        history: config.history.unwrap_or_default(),
                    },
                    _ => StateKind::Atomic,
                }
            }
        }
    }

    /// Invocations and transitions of one node, transitions ordered as
    /// `on`, `onDone`, invocation handlers, `after`, `always`.
    fn transitions(
        &mut self,
        id: &str,
        path: &[String],
        config: &StateNodeConfig,
    ) -> (Vec<Invocation>, Vec<Transition>) {
        let mut transitions = Vec::new();

        for (event, list) in config.on.iter() {
            self.push_all(&mut transitions, id, path, event, None, list);
        }
        self.push_all(&mut transitions, id, path, &done_state_event(id), None, &config.on_done);

        let mut invoke = Vec::with_capacity(config.invoke.len());
        for (index, invocation) in config.invoke.iter().enumerate() {
            let invocation_id = invocation
                .id
                .clone()
                .unwrap_or_else(|| format!("{id}:invocation[{index}]"));
            self.push_all(
                &mut transitions,
                id,
                path,
                &done_invoke_event(&invocation_id),
                None,
                &invocation.on_done,
            );
            self.push_all(
                &mut transitions,
                id,
                path,
                &error_platform_event(&invocation_id),
                None,
                &invocation.on_error,
            );
            invoke.push(Invocation {
                id: invocation_id,
                src: invocation.src.clone(),
                auto_forward: invocation.auto_forward,
                meta: invocation.meta.clone(),
            });
        }

        for (key, list) in config.after.iter() {
            let delay = Delay::from_key(key);
            let event = after_event(&delay, id);
            self.push_all(&mut transitions, id, path, &event, Some(&delay), list);
        }
        self.push_all(&mut transitions, id, path, ALWAYS_EVENT, None, &config.always);

        (invoke, transitions)
    }

    fn push_all(
        &mut self,
        transitions: &mut Vec<Transition>,
        source: &str,
        path: &[String],
        event: &str,
        delay: Option<&Delay>,
        list: &TransitionList,
    ) {
        for config in list {
            let transition = self.transition(source, path, event, delay, config);
            transitions.push(transition);
        }
    }

    fn transition(
        &mut self,
        source: &str,
        path: &[String],
        event: &str,
        delay: Option<&Delay>,
        config: &TransitionConfig,
    ) -> Transition {
        let target = config
            .target
            .iter()
            .filter_map(|target| self.target(source, path, target))
            .collect();
        let internal = config.internal.unwrap_or_else(|| {
            config.target.is_empty() || config.target.iter().any(|t| t.starts_with('.'))
        });

        Transition {
            source: source.to_string(),
            event_type: event.to_string(),
            target,
            actions: config.actions.clone(),
            cond: config.cond.clone(),
            delay: delay.cloned().or_else(|| config.delay.clone()),
            internal,
            in_state: config.in_state.clone(),
            description: config.description.clone(),
            meta: config.meta.clone(),
        }
    }

    fn target(&mut self, source: &str, path: &[String], target: &str) -> Option<String> {
        if let Some(id) = self.index.resolve(path, target) {
            return Some(id);
        }
        match self.resolution {
            Resolution::Strict => {
                self.report(ConfigError::UnknownTarget {
                    state_id: source.to_string(),
                    target: target.to_string(),
                });
                None
            }
            Resolution::Lenient => {
                warn!(
                    state_id = source,
                    reference = target,
                    "Target outside the built subtree kept as an absolute id"
                );
                Some(target.trim_start_matches(ABSOLUTE_REF_PREFIX).to_string())
            }
        }
    }
}

impl MachineDefinition {
    /// Build a definition from a machine config, reporting every structural
    /// problem at once.
    ///
    /// # Example
    ///
    /// ```rust
    /// use statemap::config::MachineConfig;
    /// use statemap::core::MachineDefinition;
    ///
    /// let config: MachineConfig = serde_json::from_str(
    ///     r#"{"id": "m", "initial": "a", "states": {"a": {"on": {"next": "b"}}, "b": {"type": "final"}}}"#,
    /// )
    /// .unwrap();
    ///
    /// let machine = MachineDefinition::from_config(&config).unwrap();
    /// let a = machine.find("m.a").unwrap();
    /// assert_eq!(a.transitions[0].target, vec!["m.b".to_string()]);
    /// ```
    pub fn from_config(config: &MachineConfig) -> Result<Self, ConfigErrors> {
        let root_id = config
            .root
            .id
            .clone()
            .unwrap_or_else(|| DEFAULT_MACHINE_ID.to_string());
        let mut importer = Importer::new(&root_id, &config.root, Resolution::Strict);
        let root = importer.node(root_id.clone(), &root_id, &[], &config.root);
        importer.finish()?;

        debug!(machine_id = %root_id, "Imported machine config");
        Ok(MachineDefinition::new(root).with_context(config.context.clone()))
    }
}

/// Build `states` as children of the existing state `parent_id`, keyed as
/// declared.
///
/// The children are indexed together, so sibling and `#id` targets between
/// them resolve, as do references to the parent itself. Never fails: other
/// targets are kept as absolute ids and structural problems are logged.
pub(crate) fn build_children(
    parent_id: &str,
    states: &IndexMap<String, StateNodeConfig>,
) -> IndexMap<String, StateNode> {
    let mut importer =
        Importer::with_index(Index::build_children(parent_id, states), Resolution::Lenient);
    states
        .iter()
        .map(|(key, config)| {
            let path = [key.clone()];
            let node = importer.node(child_id(parent_id, key, config), key, &path, config);
            (key.clone(), node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HistoryKind, DONE_INVOKE_PREFIX};

    fn import(json: &str) -> Result<MachineDefinition, ConfigErrors> {
        let config: MachineConfig = serde_json::from_str(json).unwrap();
        MachineDefinition::from_config(&config)
    }

    #[test]
    fn ids_follow_key_paths() {
        let machine = import(
            r#"{"id": "m", "initial": "a", "states": {
                "a": {"initial": "a1", "states": {"a1": {}, "a2": {"id": "custom"}}},
                "b": {}
            }}"#,
        )
        .unwrap();

        let ids: Vec<_> = crate::query::all_states(&machine.root, true)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m", "m.a", "m.a.a1", "custom", "m.b"]);
        assert_eq!(machine.root.key, "m");
        assert_eq!(machine.find("custom").map(|s| s.key.as_str()), Some("a2"));
    }

    #[test]
    fn root_without_id_gets_default() {
        let machine = import(r#"{}"#).unwrap();
        assert_eq!(machine.id(), DEFAULT_MACHINE_ID);
        assert_eq!(machine.root.state_type(), StateType::Atomic);
    }

    #[test]
    fn target_forms_resolve_to_absolute_ids() {
        let machine = import(
            r##"{"id": "m", "initial": "a", "states": {
                "a": {
                    "initial": "x",
                    "states": {"x": {}, "y": {}},
                    "on": {
                        "sibling": "b",
                        "child": ".y",
                        "absolute": "#m.b",
                        "path": "#m.a.y",
                        "nested": "b.deep"
                    }
                },
                "b": {"initial": "deep", "states": {"deep": {}}}
            }}"##,
        )
        .unwrap();

        let a = machine.find("m.a").unwrap();
        let targets: Vec<_> = a.transitions.iter().map(|t| t.target[0].as_str()).collect();
        assert_eq!(targets, vec!["m.b", "m.a.y", "m.b", "m.a.y", "m.b.deep"]);
        assert!(a.transitions[1].internal);
        assert!(!a.transitions[0].internal);
    }

    #[test]
    fn targetless_transitions_are_internal() {
        let machine = import(r#"{"id": "m", "on": {"ping": {"actions": "pong"}}}"#).unwrap();
        let transition = &machine.root.transitions[0];
        assert!(transition.target.is_empty());
        assert!(transition.internal);
    }

    #[test]
    fn transition_order_per_node() {
        let machine = import(
            r#"{"id": "m", "initial": "a", "states": {
                "a": {
                    "always": {"target": "b", "cond": "ready"},
                    "after": {"1000": "b", "slow": "b"},
                    "invoke": {"id": "svc", "src": "fetch", "onDone": "b", "onError": "b"},
                    "onDone": "b",
                    "on": {"go": "b"}
                },
                "b": {}
            }}"#,
        )
        .unwrap();

        let a = machine.find("m.a").unwrap();
        let events: Vec<_> = a.transitions.iter().map(|t| t.event_type.as_str()).collect();
        assert_eq!(
            events,
            vec![
                "go",
                "done.state.m.a",
                "done.invoke.svc",
                "error.platform.svc",
                "xstate.after(1000)#m.a",
                "xstate.after(slow)#m.a",
                "",
            ]
        );
        assert_eq!(a.transitions[4].delay, Some(Delay::Millis(1000)));
        assert_eq!(a.transitions[5].delay, Some(Delay::Named("slow".into())));
        assert_eq!(a.invoke[0].id, "svc");
    }

    #[test]
    fn anonymous_invocations_get_positional_ids() {
        let machine = import(
            r#"{"id": "m", "invoke": [{"src": "a"}, {"src": "b", "onDone": {"actions": "x"}}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = machine.root.invoke.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["m:invocation[0]", "m:invocation[1]"]);
        assert!(machine.root.transitions[0]
            .event_type
            .starts_with(DONE_INVOKE_PREFIX));
    }

    #[test]
    fn leaf_types_and_history() {
        let machine = import(
            r#"{"id": "m", "initial": "a", "states": {
                "a": {"type": "history", "history": "deep"},
                "b": {"type": "final"},
                "p": {"type": "parallel", "states": {
                    "r": {"initial": "x", "states": {"x": {}}}
                }}
            }}"#,
        )
        .unwrap();
        assert_eq!(machine.find("m.a").unwrap().history(), Some(HistoryKind::Deep));
        assert_eq!(machine.find("m.b").unwrap().state_type(), StateType::Final);
        assert_eq!(machine.find("m.p").unwrap().children().len(), 1);
    }

    #[test]
    fn collects_every_problem() {
        let errors = import(
            r#"{"id": "m", "states": {
                "a": {"on": {"go": "nowhere"}},
                "b": {"initial": "zz", "states": {"c": {"id": "m.a"}}},
                "p": {"type": "parallel"},
                "f": {"type": "final", "states": {"x": {}}}
            }}"#,
        )
        .unwrap_err();

        let errors = errors.errors();
        assert!(errors.contains(&ConfigError::MissingInitial {
            state_id: "m".into()
        }));
        assert!(errors.contains(&ConfigError::UnknownTarget {
            state_id: "m.a".into(),
            target: "nowhere".into()
        }));
        assert!(errors.contains(&ConfigError::UnknownInitial {
            state_id: "m.b".into(),
            initial: "zz".into()
        }));
        assert!(errors.contains(&ConfigError::DuplicateId { id: "m.a".into() }));
        assert!(errors.contains(&ConfigError::EmptyParallel {
            state_id: "m.p".into()
        }));
        assert!(errors.contains(&ConfigError::UnexpectedChildren {
            state_id: "m.f".into(),
            state_type: StateType::Final
        }));
        assert_eq!(errors.len(), 6);
    }

    fn declared(json: &str) -> IndexMap<String, StateNodeConfig> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn children_keep_outside_targets() {
        let states = declared(r##"{"sub": {"on": {"back": "#m.a", "up": "elsewhere"}}}"##);
        let children = build_children("m.a", &states);

        let sub = &children["sub"];
        assert_eq!(sub.id, "m.a.sub");
        assert_eq!(sub.transitions[0].target, vec!["m.a"]);
        assert_eq!(sub.transitions[1].target, vec!["elsewhere"]);
    }

    #[test]
    fn children_resolve_their_siblings() {
        let states = declared(
            r##"{
                "idle": {"on": {"load": "loading", "deep": ".inner"}, "initial": "inner", "states": {"inner": {}}},
                "loading": {"on": {"done": "#m.b.idle.inner", "up": "#m.b"}}
            }"##,
        );
        let children = build_children("m.b", &states);

        assert_eq!(children.keys().collect::<Vec<_>>(), vec!["idle", "loading"]);
        let idle = &children["idle"];
        assert_eq!(idle.transitions[0].target, vec!["m.b.loading"]);
        assert_eq!(idle.transitions[1].target, vec!["m.b.idle.inner"]);
        let loading = &children["loading"];
        assert_eq!(loading.transitions[0].target, vec!["m.b.idle.inner"]);
        assert_eq!(loading.transitions[1].target, vec!["m.b"]);
    }
}
