//! Context passed to guards and actions.

use super::state::{Event, State};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

/// String-keyed map of JSON values.
///
/// Used for the headers sent alongside an event and for the machine's
/// extended state. The map is ordered so that checkpoints and debug output
/// are stable.
///
/// # Example
///
/// ```rust
/// use statechart::core::Variables;
///
/// let headers = Variables::new().with("track", 3).with("title", "Intro");
/// assert_eq!(headers.get_as::<u32>("track"), Some(3));
/// assert!(headers.contains_key("title"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a value deserialized into `T`; `None` if absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Read-only view handed to guards.
///
/// Guards see the candidate transition, the event with its headers and the
/// machine's extended state. Nothing here can be mutated.
#[derive(Debug)]
pub struct GuardContext<'a, S: State, E: Event> {
    pub event: &'a E,
    pub source: &'a S,
    pub target: &'a S,
    pub headers: &'a Variables,
    pub variables: &'a Variables,
}

/// What an action is attached to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionScope<'a, S: State> {
    /// A transition action, run before any state is left.
    Transition { source: &'a S, target: &'a S },
    /// An entry action of the given state.
    Entry(&'a S),
    /// An exit action of the given state.
    Exit(&'a S),
}

/// An event waiting to be dispatched, with its headers.
#[derive(Clone, Debug)]
pub(crate) struct PendingEvent<E> {
    pub(crate) event: E,
    pub(crate) headers: Variables,
}

/// Mutable view handed to actions.
///
/// Actions may change the extended state and queue follow-up events. Queued
/// events are dispatched after the current dispatch has finished.
pub struct ActionContext<'a, S: State, E: Event> {
    /// The event being dispatched; `None` while the machine enters its
    /// initial configuration.
    pub event: Option<&'a E>,
    pub scope: ActionScope<'a, S>,
    pub headers: &'a Variables,
    pub variables: &'a mut Variables,
    pub(crate) queued: &'a mut VecDeque<PendingEvent<E>>,
}

impl<'a, S: State, E: Event> ActionContext<'a, S, E> {
    /// Queue an event to be dispatched once the current dispatch completes.
    pub fn send_event(&mut self, event: E) {
        self.send_event_with(event, Variables::new());
    }

    /// Queue an event with headers.
    pub fn send_event_with(&mut self, event: E, headers: Variables) {
        self.queued.push_back(PendingEvent { event, headers });
    }

    /// Number of events queued so far by this dispatch.
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        Idle,
    }

    impl State for TestState {
        fn name(&self) -> &str {
            "Idle"
        }
    }

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestEvent {
        Play,
        Stop,
    }

    impl Event for TestEvent {
        fn name(&self) -> &str {
            match self {
                Self::Play => "PLAY",
                Self::Stop => "STOP",
            }
        }
    }

    #[test]
    fn variables_insert_and_get() {
        let mut vars = Variables::new();
        assert!(vars.is_empty());

        vars.insert("track", 2);
        assert_eq!(vars.get("track"), Some(&json!(2)));
        assert_eq!(vars.get_as::<i64>("track"), Some(2));
        assert_eq!(vars.len(), 1);

        let previous = vars.insert("track", 3);
        assert_eq!(previous, Some(json!(2)));
    }

    #[test]
    fn get_as_returns_none_on_shape_mismatch() {
        let vars = Variables::new().with("title", "Intro");
        assert_eq!(vars.get_as::<u32>("title"), None);
        assert_eq!(vars.get_as::<String>("missing"), None);
    }

    #[test]
    fn variables_serialize_as_plain_map() {
        let vars = Variables::new().with("a", 1).with("b", true);
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json, json!({"a": 1, "b": true}));
    }

    #[test]
    fn action_context_queues_events_in_order() {
        let headers = Variables::new();
        let mut variables = Variables::new();
        let mut queued = VecDeque::new();

        let mut ctx: ActionContext<'_, TestState, TestEvent> = ActionContext {
            event: None,
            scope: ActionScope::Entry(&TestState::Idle),
            headers: &headers,
            variables: &mut variables,
            queued: &mut queued,
        };

        ctx.send_event(TestEvent::Play);
        ctx.send_event_with(TestEvent::Stop, Variables::new().with("why", "eject"));
        assert_eq!(ctx.queued_len(), 2);

        let first = queued.pop_front().unwrap();
        let second = queued.pop_front().unwrap();
        assert_eq!(first.event, TestEvent::Play);
        assert_eq!(second.event, TestEvent::Stop);
        assert_eq!(second.headers.get_as::<String>("why").as_deref(), Some("eject"));
    }
}
