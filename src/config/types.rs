//! Serde model of the JSON machine configuration format.
//!
//! Input accepts the usual shorthands. Output is always the long form:
//! arrays of objects, absolute `#id` targets and explicit ids.

use crate::core::{ActionRef, Delay, DoneData, GuardRef, HistoryKind, StateType};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Root configuration of a machine: the root state plus its context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(flatten)]
    pub root: StateNodeConfig,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

/// Configuration of one state node and, recursively, its children.
///
/// # Example
///
/// ```rust
/// use statemap::config::StateNodeConfig;
///
/// let config: StateNodeConfig = serde_json::from_str(
///     r#"{"initial": "idle", "states": {"idle": {"on": {"GO": "busy"}}, "busy": {}}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.states.keys().collect::<Vec<_>>(), vec!["idle", "busy"]);
/// let idle = config.states.get("idle").unwrap();
/// assert_eq!(idle.on.get("GO").unwrap()[0].target, vec!["busy".to_string()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateNodeConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub state_type: Option<StateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    /// Children in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub states: IndexMap<String, StateNodeConfig>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub on: IndexMap<String, TransitionList>,
    #[serde(default, skip_serializing_if = "TransitionList::is_empty")]
    pub always: TransitionList,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub after: IndexMap<String, TransitionList>,
    #[serde(default, skip_serializing_if = "TransitionList::is_empty")]
    pub on_done: TransitionList,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub invoke: Vec<InvokeConfig>,
    #[serde(
        default,
        deserialize_with = "action_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entry: Vec<ActionRef>,
    #[serde(
        default,
        deserialize_with = "action_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub exit: Vec<ActionRef>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryKind>,
    /// Done data mapper of a final state; in-memory only
    #[serde(skip)]
    pub data: Option<DoneData>,
}

impl StateNodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, state_type: StateType) -> Self {
        self.state_type = Some(state_type);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_state(mut self, key: impl Into<String>, state: StateNodeConfig) -> Self {
        self.states.insert(key.into(), state);
        self
    }

    pub fn with_on(mut self, event: impl Into<String>, transition: TransitionConfig) -> Self {
        self.on.entry(event.into()).or_default().0.push(transition);
        self
    }
}

/// A single transition in structured form.
///
/// Inside an `on` or `after` map the event comes from the map key and
/// `event` is left empty. The rewriter fills `event` so that transitions can
/// be moved between nodes without losing it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub target: Vec<String>,
    #[serde(
        default,
        deserialize_with = "action_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub actions: Vec<ActionRef>,
    #[serde(
        default,
        deserialize_with = "guard_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub cond: Option<GuardRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Delay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<bool>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub in_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl TransitionConfig {
    /// A transition to the given target references.
    pub fn to<I, T>(target: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn on_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.actions = actions.into_iter().collect();
        self
    }

    pub fn with_cond(mut self, cond: GuardRef) -> Self {
        self.cond = Some(cond);
        self
    }
}

/// Transitions declared for one event, in priority order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransitionList(pub Vec<TransitionConfig>);

impl TransitionList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransitionConfig> {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for TransitionList {
    type Output = TransitionConfig;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<TransitionConfig>> for TransitionList {
    fn from(transitions: Vec<TransitionConfig>) -> Self {
        Self(transitions)
    }
}

impl<'a> IntoIterator for &'a TransitionList {
    type Item = &'a TransitionConfig;
    type IntoIter = std::slice::Iter<'a, TransitionConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TransitionInput {
    Target(String),
    Config(TransitionConfig),
}

impl From<TransitionInput> for TransitionConfig {
    fn from(input: TransitionInput) -> Self {
        match input {
            TransitionInput::Target(target) => TransitionConfig::to([target]),
            TransitionInput::Config(config) => config,
        }
    }
}

impl<'de> Deserialize<'de> for TransitionList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let inputs: Vec<TransitionInput> = one_or_many(deserializer)?;
        Ok(Self(inputs.into_iter().map(Into::into).collect()))
    }
}

/// A service invoked by a state, with its completion and failure handlers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub src: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_forward: bool,
    #[serde(default, skip_serializing_if = "TransitionList::is_empty")]
    pub on_done: TransitionList,
    #[serde(default, skip_serializing_if = "TransitionList::is_empty")]
    pub on_error: TransitionList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NamedOr<T> {
    Name(String),
    Full(T),
}

fn action_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ActionRef>, D::Error> {
    let inputs: Vec<NamedOr<ActionRef>> = one_or_many(deserializer)?;
    Ok(inputs
        .into_iter()
        .map(|input| match input {
            NamedOr::Name(name) => ActionRef::new(name),
            NamedOr::Full(action) => action,
        })
        .collect())
}

fn guard_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<GuardRef>, D::Error> {
    Ok(match NamedOr::<GuardRef>::deserialize(deserializer)? {
        NamedOr::Name(name) => Some(GuardRef::new(name)),
        NamedOr::Full(guard) => Some(guard),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_shorthands() {
        let config: StateNodeConfig = serde_json::from_str(
            r##"{
                "on": {
                    "A": "a",
                    "B": {"target": ["#m.b", ".c"], "actions": "log"},
                    "C": ["x", {"target": "y", "cond": "ok"}]
                }
            }"##,
        )
        .unwrap();

        assert_eq!(config.on.get("A").unwrap()[0].target, vec!["a"]);
        let b = &config.on.get("B").unwrap()[0];
        assert_eq!(b.target, vec!["#m.b", ".c"]);
        assert_eq!(b.actions, vec![ActionRef::new("log")]);

        let c = config.on.get("C").unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].target, vec!["x"]);
        assert_eq!(c[1].cond, Some(GuardRef::new("ok")));
    }

    #[test]
    fn actions_accept_strings_and_objects() {
        let config: StateNodeConfig = serde_json::from_str(
            r#"{"entry": ["a", {"type": "b", "level": 2}], "exit": "c"}"#,
        )
        .unwrap();

        assert_eq!(config.entry[0], ActionRef::new("a"));
        assert_eq!(config.entry[1].action_type, "b");
        assert_eq!(config.entry[1].params["level"], 2);
        assert_eq!(config.exit, vec![ActionRef::new("c")]);
    }

    #[test]
    fn single_invoke_object() {
        let config: StateNodeConfig = serde_json::from_str(
            r#"{"invoke": {"id": "svc", "src": "fetch", "onDone": "ok", "onError": "failed"}}"#,
        )
        .unwrap();

        assert_eq!(config.invoke.len(), 1);
        assert_eq!(config.invoke[0].id.as_deref(), Some("svc"));
        assert_eq!(config.invoke[0].on_done[0].target, vec!["ok"]);
        assert_eq!(config.invoke[0].on_error[0].target, vec!["failed"]);
    }

    #[test]
    fn machine_config_flattens_root() {
        let config: MachineConfig = serde_json::from_str(
            r#"{"id": "m", "initial": "a", "context": {"n": 1}, "states": {"a": {}}}"#,
        )
        .unwrap();
        assert_eq!(config.root.id.as_deref(), Some("m"));
        assert_eq!(config.context["n"], 1);
        assert!(config.root.states.contains_key("a"));
    }

    #[test]
    fn maps_keep_declaration_order() {
        let config: StateNodeConfig = serde_json::from_str(
            r#"{"states": {"z": {}, "a": {}, "m": {}}, "on": {"B": "z", "A": "a"}}"#,
        )
        .unwrap();
        assert_eq!(config.states.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(config.on.keys().collect::<Vec<_>>(), vec!["B", "A"]);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.find(r#""z""#) < json.find(r#""a""#));
    }

    #[test]
    fn with_on_groups_by_event() {
        let config = StateNodeConfig::new()
            .with_on("go", TransitionConfig::to(["#m.a"]))
            .with_on("stop", TransitionConfig::to(["#m.b"]))
            .with_on("go", TransitionConfig::to(["#m.c"]));
        assert_eq!(config.on.keys().collect::<Vec<_>>(), vec!["go", "stop"]);
        assert_eq!(config.on["go"].len(), 2);
    }

    #[test]
    fn empty_fields_are_omitted_on_output() {
        let config = StateNodeConfig::new().with_type(StateType::Atomic);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"type":"atomic"}"#);
    }
}
