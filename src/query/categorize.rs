//! Semantic classification of transitions.
//!
//! Each transition falls into exactly one category. Predicates are tried in
//! a fixed order and the first match wins:
//!
//! 1. delayed (a delay is present, even on an always transition)
//! 2. always (`""`)
//! 3. wildcard (`"*"`)
//! 4. state done (`done.state.<id>`)
//! 5. invocation done (`done.invoke.<id>`)
//! 6. invocation error (`error.platform.<id>`)
//! 7. plain event
//!
//! Unrecognized event names always land in the plain event bucket, so the
//! classification is total.

use crate::core::{Transition, DONE_INVOKE_PREFIX, DONE_STATE_PREFIX, ERROR_PLATFORM_PREFIX};

/// Is `transition` delayed?
pub fn is_delayed_transition(transition: &Transition) -> bool {
    transition.delay.is_some()
}

/// Is `transition` an always (eventless) transition?
pub fn is_always_transition(transition: &Transition) -> bool {
    transition.is_always()
}

/// Is `transition` a wildcard transition?
pub fn is_wildcard_transition(transition: &Transition) -> bool {
    transition.is_wildcard()
}

/// Is `transition` taken when a state completes (a state's `onDone`)?
pub fn is_state_done_transition(transition: &Transition) -> bool {
    transition.event_type.starts_with(DONE_STATE_PREFIX)
}

/// Is `transition` taken when an invocation completes?
pub fn is_invocation_done_transition(transition: &Transition) -> bool {
    transition.event_type.starts_with(DONE_INVOKE_PREFIX)
}

/// Is `transition` taken when an invocation fails?
pub fn is_invocation_error_transition(transition: &Transition) -> bool {
    transition.event_type.starts_with(ERROR_PLATFORM_PREFIX)
}

/// Is `transition` a regular named-event transition?
///
/// Delay is not considered here; see [`categorize`] for the ordered rules.
pub fn is_event_transition(transition: &Transition) -> bool {
    !(is_always_transition(transition)
        || is_wildcard_transition(transition)
        || is_state_done_transition(transition)
        || is_invocation_done_transition(transition)
        || is_invocation_error_transition(transition))
}

/// Category of a single transition, with the id parsed out of completion
/// and error event names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionCategory<'a> {
    EventOccurred,
    StateDone { state_id: &'a str },
    InvocationDone { invocation_id: &'a str },
    InvocationError { invocation_id: &'a str },
    DelayDone,
    Always,
    Wildcard,
}

/// Classify one transition using the first matching rule.
pub fn categorize(transition: &Transition) -> TransitionCategory<'_> {
    let event = transition.event_type.as_str();

    if is_delayed_transition(transition) {
        return TransitionCategory::DelayDone;
    }
    if is_always_transition(transition) {
        return TransitionCategory::Always;
    }
    if is_wildcard_transition(transition) {
        return TransitionCategory::Wildcard;
    }
    if let Some(state_id) = event.strip_prefix(DONE_STATE_PREFIX) {
        return TransitionCategory::StateDone { state_id };
    }
    if let Some(invocation_id) = event.strip_prefix(DONE_INVOKE_PREFIX) {
        return TransitionCategory::InvocationDone { invocation_id };
    }
    if let Some(invocation_id) = event.strip_prefix(ERROR_PLATFORM_PREFIX) {
        return TransitionCategory::InvocationError { invocation_id };
    }
    TransitionCategory::EventOccurred
}

/// A transition taken on `done.state.<state_id>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateDoneTransition<'a> {
    pub transition: &'a Transition,
    pub state_id: &'a str,
}

/// A transition taken on `done.invoke.<id>` or `error.platform.<id>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvocationTransition<'a> {
    pub transition: &'a Transition,
    pub invocation_id: &'a str,
}

/// Transitions partitioned into the seven categories.
///
/// Order inside each bucket follows input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionsByCategory<'a> {
    pub event_occurred: Vec<&'a Transition>,
    pub state_done: Vec<StateDoneTransition<'a>>,
    pub invocation_done: Vec<InvocationTransition<'a>>,
    pub invocation_error: Vec<InvocationTransition<'a>>,
    pub delay_done: Vec<&'a Transition>,
    pub always: Vec<&'a Transition>,
    pub wildcard: Vec<&'a Transition>,
}

impl<'a> TransitionsByCategory<'a> {
    /// Total number of categorized transitions.
    pub fn len(&self) -> usize {
        self.event_occurred.len()
            + self.state_done.len()
            + self.invocation_done.len()
            + self.invocation_error.len()
            + self.delay_done.len()
            + self.always.len()
            + self.wildcard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All transitions from every bucket, unwrapped, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &'a Transition> + '_ {
        self.event_occurred
            .iter()
            .copied()
            .chain(self.state_done.iter().map(|s| s.transition))
            .chain(self.invocation_done.iter().map(|i| i.transition))
            .chain(self.invocation_error.iter().map(|i| i.transition))
            .chain(self.delay_done.iter().copied())
            .chain(self.always.iter().copied())
            .chain(self.wildcard.iter().copied())
    }
}

/// Partition `transitions` into categories in a single pass.
///
/// # Example
///
/// ```rust
/// use statemap::core::Transition;
/// use statemap::query::categorize_transitions;
///
/// let transitions = vec![Transition::new("m.a", "done.invoke.svc1").with_target(["b"])];
/// let categories = categorize_transitions(&transitions);
///
/// assert_eq!(categories.invocation_done.len(), 1);
/// assert_eq!(categories.invocation_done[0].invocation_id, "svc1");
/// assert_eq!(categories.len(), 1);
/// ```
pub fn categorize_transitions<'a, I>(transitions: I) -> TransitionsByCategory<'a>
where
    I: IntoIterator<Item = &'a Transition>,
{
    transitions
        .into_iter()
        .fold(TransitionsByCategory::default(), |mut categories, transition| {
            match categorize(transition) {
                TransitionCategory::DelayDone => categories.delay_done.push(transition),
                TransitionCategory::Always => categories.always.push(transition),
                TransitionCategory::Wildcard => categories.wildcard.push(transition),
                TransitionCategory::StateDone { state_id } => {
                    categories.state_done.push(StateDoneTransition {
                        transition,
                        state_id,
                    })
                }
                TransitionCategory::InvocationDone { invocation_id } => {
                    categories.invocation_done.push(InvocationTransition {
                        transition,
                        invocation_id,
                    })
                }
                TransitionCategory::InvocationError { invocation_id } => {
                    categories.invocation_error.push(InvocationTransition {
                        transition,
                        invocation_id,
                    })
                }
                TransitionCategory::EventOccurred => categories.event_occurred.push(transition),
            }
            categories
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Delay;

    fn t(event: &str) -> Transition {
        Transition::new("m.a", event).with_target(["m.b"])
    }

    #[test]
    fn invocation_done_extracts_id() {
        let transitions = vec![t("done.invoke.svc1")];
        let categories = categorize_transitions(&transitions);

        assert_eq!(categories.invocation_done.len(), 1);
        assert_eq!(categories.invocation_done[0].invocation_id, "svc1");
        assert!(categories.event_occurred.is_empty());
        assert!(categories.state_done.is_empty());
        assert!(categories.invocation_error.is_empty());
        assert!(categories.delay_done.is_empty());
        assert!(categories.always.is_empty());
        assert!(categories.wildcard.is_empty());
    }

    #[test]
    fn delayed_always_is_delay_done() {
        let transitions = vec![t("").with_delay(Delay::Millis(5))];
        let categories = categorize_transitions(&transitions);

        assert_eq!(categories.delay_done.len(), 1);
        assert!(categories.always.is_empty());
    }

    #[test]
    fn state_done_keeps_dotted_ids() {
        let transitions = vec![t("done.state.m.b.c")];
        let categories = categorize_transitions(&transitions);
        assert_eq!(categories.state_done[0].state_id, "m.b.c");
    }

    #[test]
    fn error_platform_extracts_id() {
        let transitions = vec![t("error.platform.upload")];
        let categories = categorize_transitions(&transitions);
        assert_eq!(categories.invocation_error[0].invocation_id, "upload");
    }

    #[test]
    fn wildcard_and_plain_events() {
        let transitions = vec![t("*"), t("next"), t("done"), t("done.stateX")];
        let categories = categorize_transitions(&transitions);
        assert_eq!(categories.wildcard.len(), 1);
        assert_eq!(categories.event_occurred.len(), 3);
    }

    #[test]
    fn every_transition_lands_in_exactly_one_bucket() {
        let transitions = vec![
            t("go"),
            t(""),
            t("*"),
            t("done.state.m"),
            t("done.invoke.a"),
            t("error.platform.a"),
            t("go").with_delay(Delay::Named("slow".into())),
        ];
        let categories = categorize_transitions(&transitions);
        assert_eq!(categories.len(), transitions.len());
        assert_eq!(categories.event_occurred.len(), 1);
        assert_eq!(categories.always.len(), 1);
        assert_eq!(categories.wildcard.len(), 1);
        assert_eq!(categories.state_done.len(), 1);
        assert_eq!(categories.invocation_done.len(), 1);
        assert_eq!(categories.invocation_error.len(), 1);
        assert_eq!(categories.delay_done.len(), 1);
    }

    #[test]
    fn bucket_order_follows_input() {
        let transitions = vec![t("a"), t("b"), t("c")];
        let categories = categorize_transitions(&transitions);
        let events: Vec<_> = categories
            .event_occurred
            .iter()
            .map(|t| t.event_type.as_str())
            .collect();
        assert_eq!(events, vec!["a", "b", "c"]);
    }

    #[test]
    fn event_predicate_ignores_delay() {
        assert!(is_event_transition(&t("tick")));
        assert!(!is_event_transition(&t("")));
        assert!(!is_event_transition(&t("error.platform.x")));
    }
}
