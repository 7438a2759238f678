//! Layering transitions, invocations and metadata onto random shapes.

use super::descriptor::{machine_descriptor, StateDescriptor};
use super::names::{event_name, plain_name, NamePool};
use crate::core::{
    after_event, done_invoke_event, done_state_event, error_platform_event, ActionRef, Delay, DoneData,
    GuardRef, HistoryKind, Invocation, MachineDefinition, StateKind, StateNode, StateType,
    Transition, ALWAYS_EVENT,
};
use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;
use proptest::sample::select;
use serde_json::Value;
use std::collections::HashSet;

/// Maximum updates layered onto one state.
const MAX_UPDATES: usize = 3;
/// Maximum actions on one generated transition.
const MAX_ACTIONS: usize = 3;

/// A random machine definition together with every name embedded in it.
///
/// Each list is deduplicated and keeps first-seen order. `states` holds the
/// ids of every state except the root.
#[derive(Clone, Debug)]
pub struct ArbitraryMachine {
    pub machine: MachineDefinition,
    pub states: Vec<String>,
    pub events: Vec<String>,
    pub actions: Vec<String>,
    pub conditions: Vec<String>,
    pub services: Vec<String>,
}

/// Laid-out tree with unique ids.
#[derive(Clone, Debug)]
struct Shape {
    id: String,
    state_type: StateType,
    children: Vec<Shape>,
}

impl Shape {
    fn layout(descriptor: &StateDescriptor) -> Shape {
        let mut pool = NamePool::new();
        Self::place(descriptor, &mut pool)
    }

    fn place(descriptor: &StateDescriptor, pool: &mut NamePool) -> Shape {
        let id = pool.claim(&descriptor.name);
        let children = descriptor
            .children
            .iter()
            .map(|child| Self::place(child, pool))
            .collect();
        Shape {
            id,
            state_type: descriptor.state_type,
            children,
        }
    }

    fn pre_order(&self) -> Vec<&Shape> {
        let mut shapes = vec![self];
        for child in &self.children {
            shapes.extend(child.pre_order());
        }
        shapes
    }
}

#[derive(Clone, Debug)]
struct TransitionDraft {
    target: Option<String>,
    actions: Vec<String>,
    cond: Option<String>,
    delay: Option<Delay>,
}

#[derive(Clone, Debug)]
struct InvokeDraft {
    id: String,
    src: String,
    on_done: Option<TransitionDraft>,
    on_error: Option<TransitionDraft>,
}

#[derive(Clone, Debug)]
enum Update {
    On {
        event: String,
        transition: TransitionDraft,
    },
    Always(TransitionDraft),
    /// Delayed transition; its delay is always set
    After(TransitionDraft),
    OnDone(TransitionDraft),
    Invoke(Option<InvokeDraft>),
    /// Index into the children, taken modulo their count
    Initial(usize),
    DoneData(Value),
}

fn delay() -> impl Strategy<Value = Delay> {
    prop_oneof![
        (0u64..10_000).prop_map(Delay::Millis),
        // a numeric name would read back as a duration
        "\\PC{1,8}"
            .prop_filter("numeric delay name", |name| name.parse::<u64>().is_err())
            .prop_map(Delay::Named),
    ]
}

fn target(state_ids: &[String]) -> BoxedStrategy<Option<String>> {
    if state_ids.is_empty() {
        Just(None).boxed()
    } else {
        prop_oneof![Just(None), select(state_ids.to_vec()).prop_map(Some)].boxed()
    }
}

fn transition(state_ids: &[String]) -> BoxedStrategy<TransitionDraft> {
    (
        target(state_ids),
        vec(plain_name(), 0..=MAX_ACTIONS),
        option::of(plain_name()),
        option::of(delay()),
    )
        .prop_map(|(target, actions, cond, delay)| TransitionDraft {
            target,
            actions,
            cond,
            delay,
        })
        .boxed()
}

fn invocation(state_ids: &[String]) -> BoxedStrategy<InvokeDraft> {
    (
        plain_name(),
        plain_name(),
        option::of(transition(state_ids)),
        option::of(transition(state_ids)),
    )
        .prop_map(|(id, src, on_done, on_error)| InvokeDraft {
            id,
            src,
            on_done,
            on_error,
        })
        .boxed()
}

fn done_data() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        plain_name().prop_map(Value::from),
    ];
    btree_map(plain_name(), leaf, 0..=3).prop_map(|map| Value::Object(map.into_iter().collect()))
}

/// Event, always and delayed transitions, and invocations.
fn standard_update(state_ids: &[String]) -> BoxedStrategy<Update> {
    prop_oneof![
        (event_name(), transition(state_ids))
            .prop_map(|(event, transition)| Update::On { event, transition }),
        transition(state_ids).prop_map(Update::Always),
        (delay(), transition(state_ids)).prop_map(|(delay, mut transition)| {
            transition.delay = Some(delay);
            Update::After(transition)
        }),
        option::of(invocation(state_ids)).prop_map(Update::Invoke),
    ]
    .boxed()
}

fn updates_for(
    state_type: StateType,
    is_root: bool,
    state_ids: &[String],
) -> BoxedStrategy<Vec<Update>> {
    let standard = vec(standard_update(state_ids), 0..=MAX_UPDATES);

    if is_root {
        // a root never completes, so it gets no onDone
        return (standard, any::<usize>())
            .prop_map(|(mut updates, initial)| {
                updates.push(Update::Initial(initial));
                updates
            })
            .boxed();
    }

    match state_type {
        StateType::Atomic => standard.boxed(),
        StateType::Compound => (standard, transition(state_ids), any::<usize>())
            .prop_map(|(mut updates, on_done, initial)| {
                updates.push(Update::OnDone(on_done));
                updates.push(Update::Initial(initial));
                updates
            })
            .boxed(),
        StateType::Parallel => vec(
            prop_oneof![
                standard_update(state_ids),
                transition(state_ids).prop_map(Update::OnDone),
            ],
            0..=MAX_UPDATES,
        )
        .boxed(),
        StateType::Final => (
            option::of(done_data()),
            vec(
                option::of(invocation(state_ids)).prop_map(Update::Invoke),
                0..=MAX_UPDATES,
            ),
        )
            .prop_map(|(data, mut updates)| {
                updates.extend(data.map(Update::DoneData));
                updates
            })
            .boxed(),
        StateType::History => Just(Vec::new()).boxed(),
    }
}

/// Names seen while assembling, in first-seen order with repeats.
#[derive(Debug, Default)]
struct Names {
    events: Vec<String>,
    actions: Vec<String>,
    conditions: Vec<String>,
    services: Vec<String>,
}

impl Names {
    fn transition(&mut self, source: &str, event: String, draft: &TransitionDraft) -> Transition {
        self.events.push(event.clone());
        self.actions.extend(draft.actions.iter().cloned());
        self.conditions.extend(draft.cond.iter().cloned());

        Transition {
            source: source.to_string(),
            event_type: event,
            target: draft.target.iter().cloned().collect(),
            actions: draft.actions.iter().map(ActionRef::new).collect(),
            cond: draft.cond.as_ref().map(GuardRef::new),
            delay: draft.delay.clone(),
            internal: draft.target.is_none(),
            in_state: None,
            description: None,
            meta: None,
        }
    }
}

fn assemble(
    shape: &Shape,
    updates: &mut std::vec::IntoIter<Vec<Update>>,
    names: &mut Names,
) -> StateNode {
    let own = updates.next().unwrap_or_default();
    let id = shape.id.as_str();

    let mut transitions = Vec::new();
    let mut invoke = Vec::new();
    let mut initial = None;
    let mut data = None;

    for update in own {
        match update {
            Update::On { event, transition } => {
                transitions.push(names.transition(id, event, &transition));
            }
            Update::Always(transition) => {
                transitions.push(names.transition(id, ALWAYS_EVENT.to_string(), &transition));
            }
            Update::After(transition) => {
                let event = transition
                    .delay
                    .as_ref()
                    .map(|delay| after_event(delay, id))
                    .unwrap_or_default();
                transitions.push(names.transition(id, event, &transition));
            }
            Update::OnDone(transition) => {
                transitions.push(names.transition(id, done_state_event(id), &transition));
            }
            Update::Invoke(Some(draft)) => {
                if let Some(on_done) = &draft.on_done {
                    transitions.push(names.transition(id, done_invoke_event(&draft.id), on_done));
                }
                if let Some(on_error) = &draft.on_error {
                    transitions.push(names.transition(id, error_platform_event(&draft.id), on_error));
                }
                names.services.push(draft.src.clone());
                invoke.push(Invocation::new(draft.id, draft.src));
            }
            Update::Invoke(None) => {}
            Update::Initial(index) => initial = Some(index),
            Update::DoneData(value) => data = Some(DoneData::constant(value)),
        }
    }

    let children: Vec<StateNode> = shape
        .children
        .iter()
        .map(|child| assemble(child, updates, names))
        .collect();

    let kind = match shape.state_type {
        StateType::Compound if !children.is_empty() => {
            let index = initial.unwrap_or(0) % children.len();
            StateKind::Compound {
                initial: children[index].key.clone(),
                states: children,
            }
        }
        StateType::Parallel => StateKind::Parallel { states: children },
        StateType::Final => StateKind::Final { done_data: data },
        StateType::History => StateKind::History {
            history: HistoryKind::Shallow,
        },
        StateType::Compound | StateType::Atomic => StateKind::Atomic,
    };

    StateNode {
        id: shape.id.clone(),
        key: shape.id.clone(),
        kind,
        entry: Vec::new(),
        exit: Vec::new(),
        invoke,
        transitions,
        tags: Vec::new(),
        meta: None,
        description: None,
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn build(shape: &Shape, updates: Vec<Vec<Update>>) -> ArbitraryMachine {
    let mut names = Names::default();
    let root = assemble(shape, &mut updates.into_iter(), &mut names);
    let states = shape
        .pre_order()
        .into_iter()
        .skip(1)
        .map(|s| s.id.clone())
        .collect();

    ArbitraryMachine {
        machine: MachineDefinition::new(root),
        states,
        events: dedup(names.events),
        actions: dedup(names.actions),
        conditions: dedup(names.conditions),
        services: dedup(names.services),
    }
}

/// Strategy for random, well-formed machine definitions.
///
/// The shape is drawn first and shrinks first. Transitions, invocations,
/// initial states and done data are then drawn per state, targeting only
/// states that exist in the shape. Ids are unique: a repeated name gets a
/// numeric suffix.
///
/// # Example
///
/// ```rust
/// use proptest::strategy::{Strategy, ValueTree};
/// use proptest::test_runner::TestRunner;
/// use statemap::arbitrary::arbitrary_machine;
/// use statemap::query::all_proper_states;
///
/// let mut runner = TestRunner::deterministic();
/// let generated = arbitrary_machine().new_tree(&mut runner).unwrap().current();
///
/// let ids: Vec<_> = all_proper_states(&generated.machine.root)
///     .map(|s| s.id.clone())
///     .collect();
/// assert_eq!(ids, generated.states);
/// ```
pub fn arbitrary_machine() -> impl Strategy<Value = ArbitraryMachine> {
    machine_descriptor().prop_flat_map(|descriptor| {
        let shape = Shape::layout(&descriptor);
        let shapes = shape.pre_order();
        let state_ids: Vec<String> = shapes.iter().skip(1).map(|s| s.id.clone()).collect();
        let updates: Vec<BoxedStrategy<Vec<Update>>> = shapes
            .iter()
            .enumerate()
            .map(|(index, s)| updates_for(s.state_type, index == 0, &state_ids))
            .collect();

        updates.prop_map(move |updates| build(&shape, updates))
    })
}
