//! Pending transformation of a single state node.

use crate::config::{transition_config, InvokeConfig, StateNodeConfig, TransitionConfig};
use crate::core::{
    done_invoke_event, error_platform_event, ActionRef, DoneData, HistoryKind, Invocation,
    StateKind, StateNode, StateType, Transition, ABSOLUTE_REF_PREFIX,
};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// A state node as seen by a rewriting mapper.
///
/// The read view (`id()`, `readonly_transitions()`, `entry()`, ...) always
/// reports the original definition. The `get_*` methods report the current
/// value of a facet, including every mutation applied so far.
///
/// Every mutator consumes the node and returns the updated one. Within a
/// chain the last write to a facet wins, and `append_*` extends whatever the
/// facet currently holds.
///
/// # Example
///
/// ```rust
/// use statemap::config::TransitionConfig;
/// use statemap::core::{ActionRef, StateNode, Transition};
/// use statemap::rewrite::UpdatableNode;
///
/// let state = StateNode::atomic("m.a", "a")
///     .with_transitions([Transition::new("m.a", "go").with_target(["m.b"])]);
///
/// let node = UpdatableNode::new(&state)
///     .append_transition(TransitionConfig::to(["#m.a"]).on_event("back"))
///     .append_entry_action(ActionRef::new("log"));
///
/// assert_eq!(node.get_transitions().len(), 2);
/// assert_eq!(node.readonly_transitions().len(), 1);
/// assert_eq!(node.get_entry_actions(), &[ActionRef::new("log")]);
/// ```
#[derive(Clone, Debug)]
pub struct UpdatableNode {
    original: StateNode,
    child_keys: Vec<String>,
    transitions: Option<Vec<TransitionConfig>>,
    invocations: Option<Vec<InvokeConfig>>,
    entry: Option<Vec<ActionRef>>,
    exit: Option<Vec<ActionRef>>,
    initial: Option<String>,
    tags: Option<Vec<String>>,
    meta: Option<Option<Value>>,
    description: Option<Option<String>>,
    history: Option<HistoryKind>,
    done_data: Option<DoneData>,
    child_states: Option<IndexMap<String, StateNodeConfig>>,
}

impl UpdatableNode {
    /// Start a transformation of `state` with no pending changes.
    pub fn new(state: &StateNode) -> Self {
        Self {
            original: state.without_children(),
            child_keys: state.children().iter().map(|c| c.key.clone()).collect(),
            transitions: None,
            invocations: None,
            entry: None,
            exit: None,
            initial: None,
            tags: None,
            meta: None,
            description: None,
            history: None,
            done_data: None,
            child_states: None,
        }
    }

    // Read view of the original definition

    pub fn id(&self) -> &str {
        &self.original.id
    }

    pub fn key(&self) -> &str {
        &self.original.key
    }

    pub fn state_type(&self) -> StateType {
        self.original.state_type()
    }

    /// Transitions as originally declared on this node.
    ///
    /// Read-only: the materialized node takes its transitions from
    /// [`get_transitions`](Self::get_transitions).
    pub fn readonly_transitions(&self) -> &[Transition] {
        &self.original.transitions
    }

    pub fn entry(&self) -> &[ActionRef] {
        &self.original.entry
    }

    pub fn exit(&self) -> &[ActionRef] {
        &self.original.exit
    }

    pub fn invoke(&self) -> &[Invocation] {
        &self.original.invoke
    }

    pub fn initial(&self) -> Option<&str> {
        self.original.initial()
    }

    pub fn tags(&self) -> &[String] {
        &self.original.tags
    }

    pub fn meta(&self) -> Option<&Value> {
        self.original.meta.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.original.description.as_deref()
    }

    pub fn history(&self) -> Option<HistoryKind> {
        self.original.history()
    }

    pub fn done_data(&self) -> Option<&DoneData> {
        self.original.done_data()
    }

    /// Keys of the original children, in declaration order.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.child_keys.iter().map(String::as_str)
    }

    // Current values

    /// Current transitions in structured form, with `#id` targets.
    pub fn get_transitions(&self) -> Vec<TransitionConfig> {
        match &self.transitions {
            Some(transitions) => transitions.clone(),
            None => self.original_transitions(),
        }
    }

    pub fn get_invocations(&self) -> Vec<InvokeConfig> {
        match &self.invocations {
            Some(invocations) => invocations.clone(),
            None => self.original_invocations(),
        }
    }

    pub fn get_entry_actions(&self) -> &[ActionRef] {
        self.entry.as_deref().unwrap_or(&self.original.entry)
    }

    pub fn get_exit_actions(&self) -> &[ActionRef] {
        self.exit.as_deref().unwrap_or(&self.original.exit)
    }

    fn original_transitions(&self) -> Vec<TransitionConfig> {
        self.original.transitions.iter().map(transition_config).collect()
    }

    fn original_invocations(&self) -> Vec<InvokeConfig> {
        self.original
            .invoke
            .iter()
            .map(|invocation| InvokeConfig {
                id: Some(invocation.id.clone()),
                src: invocation.src.clone(),
                auto_forward: invocation.auto_forward,
                meta: invocation.meta.clone(),
                ..InvokeConfig::default()
            })
            .collect()
    }

    // Transitions

    pub fn clear_transitions(mut self) -> Self {
        self.transitions = Some(Vec::new());
        self
    }

    /// Add a transition after the current ones. Its `event` defaults to
    /// the always event when unset.
    pub fn append_transition(mut self, transition: TransitionConfig) -> Self {
        let mut transitions = self.take_transitions();
        transitions.push(transition);
        self.transitions = Some(transitions);
        self
    }

    pub fn transform_transitions<F>(mut self, f: F) -> Self
    where
        F: FnMut(TransitionConfig) -> TransitionConfig,
    {
        let transitions = self.take_transitions();
        self.transitions = Some(transitions.into_iter().map(f).collect());
        self
    }

    pub fn set_transitions<I>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = TransitionConfig>,
    {
        self.transitions = Some(transitions.into_iter().collect());
        self
    }

    fn take_transitions(&mut self) -> Vec<TransitionConfig> {
        match self.transitions.take() {
            Some(transitions) => transitions,
            None => self.original_transitions(),
        }
    }

    // Invocations

    pub fn clear_invocations(mut self) -> Self {
        self.invocations = Some(Vec::new());
        self
    }

    /// Add an invocation after the current ones. Its `onDone`/`onError`
    /// handlers become transitions of this node.
    pub fn append_invocation(mut self, invocation: InvokeConfig) -> Self {
        let mut invocations = self.take_invocations();
        invocations.push(invocation);
        self.invocations = Some(invocations);
        self
    }

    pub fn transform_invocations<F>(mut self, f: F) -> Self
    where
        F: FnMut(InvokeConfig) -> InvokeConfig,
    {
        let invocations = self.take_invocations();
        self.invocations = Some(invocations.into_iter().map(f).collect());
        self
    }

    pub fn set_invocations<I>(mut self, invocations: I) -> Self
    where
        I: IntoIterator<Item = InvokeConfig>,
    {
        self.invocations = Some(invocations.into_iter().collect());
        self
    }

    fn take_invocations(&mut self) -> Vec<InvokeConfig> {
        match self.invocations.take() {
            Some(invocations) => invocations,
            None => self.original_invocations(),
        }
    }

    // Entry and exit actions

    pub fn clear_entry_actions(mut self) -> Self {
        self.entry = Some(Vec::new());
        self
    }

    pub fn append_entry_action(mut self, action: ActionRef) -> Self {
        let original = &self.original.entry;
        self.entry
            .get_or_insert_with(|| original.clone())
            .push(action);
        self
    }

    pub fn transform_entry_actions<F>(mut self, f: F) -> Self
    where
        F: FnMut(ActionRef) -> ActionRef,
    {
        let actions = self.entry.take().unwrap_or_else(|| self.original.entry.clone());
        self.entry = Some(actions.into_iter().map(f).collect());
        self
    }

    pub fn set_entry_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.entry = Some(actions.into_iter().collect());
        self
    }

    pub fn clear_exit_actions(mut self) -> Self {
        self.exit = Some(Vec::new());
        self
    }

    pub fn append_exit_action(mut self, action: ActionRef) -> Self {
        let original = &self.original.exit;
        self.exit
            .get_or_insert_with(|| original.clone())
            .push(action);
        self
    }

    pub fn transform_exit_actions<F>(mut self, f: F) -> Self
    where
        F: FnMut(ActionRef) -> ActionRef,
    {
        let actions = self.exit.take().unwrap_or_else(|| self.original.exit.clone());
        self.exit = Some(actions.into_iter().map(f).collect());
        self
    }

    pub fn set_exit_actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = ActionRef>,
    {
        self.exit = Some(actions.into_iter().collect());
        self
    }

    // Scalar facets

    /// Set the initial child key. Applies to compound nodes and to atomic
    /// nodes that gain children through [`set_child_states`](Self::set_child_states).
    pub fn set_initial(mut self, initial: impl Into<String>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn set_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the metadata. `Value::Null` removes it.
    pub fn set_meta(mut self, meta: Value) -> Self {
        self.meta = Some((!meta.is_null()).then_some(meta));
        self
    }

    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Only meaningful on history nodes.
    pub fn set_history_kind(mut self, history: HistoryKind) -> Self {
        self.history = Some(history);
        self
    }

    /// Only meaningful on final nodes.
    pub fn set_done_data_mapper(mut self, done_data: DoneData) -> Self {
        self.done_data = Some(done_data);
        self
    }

    /// Declare child states by config.
    ///
    /// They are added after the original children; a key that matches an
    /// original child replaces that child in place. Declared children are
    /// not passed through the mapper.
    pub fn set_child_states<I, K>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = (K, StateNodeConfig)>,
        K: Into<String>,
    {
        self.child_states = Some(
            states
                .into_iter()
                .map(|(key, state)| (key.into(), state))
                .collect(),
        );
        self
    }

    /// Apply every pending change, producing a childless node plus what is
    /// needed to attach its children.
    pub(crate) fn materialize(self) -> Materialized {
        let UpdatableNode {
            original,
            transitions,
            invocations,
            entry,
            exit,
            initial,
            tags,
            meta,
            description,
            history,
            done_data,
            child_states,
            ..
        } = self;
        let id = original.id.clone();

        let mut node_transitions = match transitions {
            Some(configs) => configs
                .iter()
                .map(|config| from_structured(&id, config))
                .collect(),
            None => original.transitions,
        };

        let invoke = match invocations {
            Some(configs) => {
                let mut invoke = Vec::with_capacity(configs.len());
                for (index, config) in configs.into_iter().enumerate() {
                    let invocation_id = config
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("{id}:invocation[{index}]"));
                    for handler in &config.on_done {
                        let mut transition = from_structured(&id, handler);
                        transition.event_type = done_invoke_event(&invocation_id);
                        node_transitions.push(transition);
                    }
                    for handler in &config.on_error {
                        let mut transition = from_structured(&id, handler);
                        transition.event_type = error_platform_event(&invocation_id);
                        node_transitions.push(transition);
                    }
                    invoke.push(Invocation {
                        id: invocation_id,
                        src: config.src,
                        auto_forward: config.auto_forward,
                        meta: config.meta,
                    });
                }
                invoke
            }
            None => original.invoke,
        };

        let kind = match original.kind {
            StateKind::Compound {
                initial: original_initial,
                states,
            } => StateKind::Compound {
                initial: initial.clone().unwrap_or(original_initial),
                states,
            },
            StateKind::History { history: original_history } => StateKind::History {
                history: history.unwrap_or(original_history),
            },
            StateKind::Final {
                done_data: original_done_data,
            } => StateKind::Final {
                done_data: done_data.or(original_done_data),
            },
            other => {
                if history.is_some() || done_data.is_some() {
                    debug!(state_id = %id, state_type = %other.state_type(), "Ignoring facet that does not apply to this state type");
                }
                other
            }
        };

        Materialized {
            node: StateNode {
                id,
                key: original.key,
                kind,
                entry: entry.unwrap_or(original.entry),
                exit: exit.unwrap_or(original.exit),
                invoke,
                transitions: node_transitions,
                tags: tags.unwrap_or(original.tags),
                meta: meta.unwrap_or(original.meta),
                description: description.unwrap_or(original.description),
            },
            initial,
            child_states,
        }
    }
}

/// A mapped node before its children are attached.
#[derive(Debug)]
pub(crate) struct Materialized {
    /// Node with every facet applied and no children
    pub node: StateNode,
    /// Pending initial key, used when an atomic node gains children
    pub initial: Option<String>,
    pub child_states: Option<IndexMap<String, StateNodeConfig>>,
}

/// Convert a structured transition back into a definition transition on
/// `source`. `#id` targets become ids; anything else is taken as an id
/// as written.
fn from_structured(source: &str, config: &TransitionConfig) -> Transition {
    let target: Vec<String> = config
        .target
        .iter()
        .map(|target| match target.strip_prefix(ABSOLUTE_REF_PREFIX) {
            Some(id) => id.to_string(),
            None => {
                debug!(state_id = source, reference = %target, "Non-absolute target taken as a state id");
                target.clone()
            }
        })
        .collect();
    let internal = config.internal.unwrap_or(target.is_empty());

    Transition {
        source: source.to_string(),
        event_type: config.event.clone().unwrap_or_default(),
        target,
        actions: config.actions.clone(),
        cond: config.cond.clone(),
        delay: config.delay.clone(),
        internal,
        in_state: config.in_state.clone(),
        description: config.description.clone(),
        meta: config.meta.clone(),
    }
}
