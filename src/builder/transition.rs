//! Builder for constructing transitions.

use crate::builder::error::{ConfigViolation, ConfigurationError};
use crate::core::{Action, ActionContext, ActionError, Event, Guard, GuardContext, State};
use crate::table::{Transition, TransitionKind};

/// Builder for constructing transitions with a fluent API.
pub struct TransitionBuilder<S: State, E: Event> {
    from: Option<S>,
    to: Option<S>,
    event: Option<E>,
    guard: Option<Guard<S, E>>,
    actions: Vec<Action<S, E>>,
    kind: TransitionKind,
}

impl<S: State, E: Event> TransitionBuilder<S, E> {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self {
            from: None,
            to: None,
            event: None,
            guard: None,
            actions: Vec::new(),
            kind: TransitionKind::External,
        }
    }

    /// Set the source state (required).
    pub fn from(mut self, state: S) -> Self {
        self.from = Some(state);
        self
    }

    /// Set the target state (required unless `.internal()`).
    pub fn to(mut self, state: S) -> Self {
        self.to = Some(state);
        self
    }

    /// Set the triggering event (required).
    pub fn on(mut self, event: E) -> Self {
        self.event = Some(event);
        self
    }

    /// Add a guard (optional).
    pub fn guard(mut self, guard: Guard<S, E>) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add a guard using a closure (optional).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_, S, E>) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Append an action; actions run in the order they were added.
    pub fn action(mut self, action: Action<S, E>) -> Self {
        self.actions.push(action);
        self
    }

    /// Append a fallible action from a closure.
    pub fn action_fn<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.action(Action::new(name, hook))
    }

    /// Make this an internal transition: actions only, target is the source.
    pub fn internal(mut self) -> Self {
        self.kind = TransitionKind::Internal;
        self
    }

    /// Make this a local transition.
    pub fn local(mut self) -> Self {
        self.kind = TransitionKind::Local;
        self
    }

    pub fn kind(mut self, kind: TransitionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Build the transition, reporting every missing field.
    pub fn build(self) -> Result<Transition<S, E>, ConfigurationError> {
        let to = match (self.kind, self.to) {
            (TransitionKind::Internal, None) => self.from.clone(),
            (_, to) => to,
        };

        match (self.from, to, self.event) {
            (Some(source), Some(target), Some(event)) => Ok(Transition {
                source,
                target,
                event,
                guard: self.guard,
                actions: self.actions,
                kind: self.kind,
            }),
            (from, to, event) => {
                let mut violations = Vec::new();
                if from.is_none() {
                    violations.push(ConfigViolation::MissingFromState);
                }
                if to.is_none() {
                    violations.push(ConfigViolation::MissingToState);
                }
                if event.is_none() {
                    violations.push(ConfigViolation::MissingEvent);
                }
                Err(ConfigurationError::new(violations))
            }
        }
    }
}

impl<S: State, E: Event> Default for TransitionBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::state_enum! {
        enum TestState { Stopped, Playing }
    }

    crate::event_enum! {
        enum TestEvent { Play }
    }

    #[test]
    fn builder_validates_required_fields() {
        let result = TransitionBuilder::<TestState, TestEvent>::new()
            .from(TestState::Stopped)
            .build();

        let err = result.unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConfigViolation::MissingToState, ConfigViolation::MissingEvent]
        );
    }

    #[test]
    fn builder_reports_everything_missing() {
        let err = TransitionBuilder::<TestState, TestEvent>::new()
            .build()
            .unwrap_err();
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn internal_transition_targets_its_source() {
        let transition = TransitionBuilder::<TestState, TestEvent>::new()
            .from(TestState::Playing)
            .on(TestEvent::Play)
            .internal()
            .build()
            .unwrap();

        assert_eq!(transition.target, TestState::Playing);
        assert_eq!(transition.kind, TransitionKind::Internal);
    }

    #[test]
    fn fluent_api_builds_transition() {
        let transition = TransitionBuilder::new()
            .from(TestState::Stopped)
            .to(TestState::Playing)
            .on(TestEvent::Play)
            .when(|ctx: &GuardContext<'_, TestState, TestEvent>| ctx.variables.contains_key("disc"))
            .action_fn("spin up", |_| Ok(()))
            .local()
            .build()
            .unwrap();

        assert_eq!(transition.source, TestState::Stopped);
        assert_eq!(transition.target, TestState::Playing);
        assert!(transition.is_guarded());
        assert_eq!(transition.actions.len(), 1);
        assert_eq!(transition.actions[0].name(), "spin up");
        assert_eq!(transition.kind, TransitionKind::Local);
    }
}
