//! Transition descriptors.

use crate::core::{Action, Event, Guard, GuardContext, State};
use serde::{Deserialize, Serialize};

/// How a transition treats the states between its source and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Leaves the source (up to the common ancestor) and enters the target.
    /// A self-transition exits and re-enters its state.
    #[default]
    External,
    /// Runs its actions only; no state is exited or entered.
    Internal,
    /// Does not leave a containing source or re-enter a containing target.
    Local,
}

/// A rule mapping (source, event, guard) to (target, actions).
pub struct Transition<S: State, E: Event> {
    pub source: S,
    pub target: S,
    pub event: E,
    pub guard: Option<Guard<S, E>>,
    pub actions: Vec<Action<S, E>>,
    pub kind: TransitionKind,
}

impl<S: State, E: Event> Transition<S, E> {
    /// Check whether the guard lets this transition fire; no guard means yes.
    pub fn guard_allows(&self, ctx: &GuardContext<'_, S, E>) -> bool {
        self.guard.as_ref().map_or(true, |g| g.check(ctx))
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }
}

impl<S: State, E: Event> Clone for Transition<S, E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            target: self.target.clone(),
            event: self.event.clone(),
            guard: self.guard.clone(),
            actions: self.actions.clone(),
            kind: self.kind,
        }
    }
}

impl<S: State, E: Event> std::fmt::Debug for Transition<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("event", &self.event)
            .field("guarded", &self.guard.is_some())
            .field("actions", &self.actions)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Variables;

    crate::state_enum! {
        enum TestState { Stopped, Playing }
    }

    crate::event_enum! {
        enum TestEvent { Play }
    }

    fn guard_ctx_allows(transition: &Transition<TestState, TestEvent>, variables: &Variables) -> bool {
        let headers = Variables::new();
        let ctx = GuardContext {
            event: &transition.event,
            source: &transition.source,
            target: &transition.target,
            headers: &headers,
            variables,
        };
        transition.guard_allows(&ctx)
    }

    #[test]
    fn unguarded_transition_always_allows() {
        let transition: Transition<TestState, TestEvent> = Transition {
            source: TestState::Stopped,
            target: TestState::Playing,
            event: TestEvent::Play,
            guard: None,
            actions: Vec::new(),
            kind: TransitionKind::External,
        };

        assert!(!transition.is_guarded());
        assert!(guard_ctx_allows(&transition, &Variables::new()));
    }

    #[test]
    fn guard_decides_eligibility() {
        let transition: Transition<TestState, TestEvent> = Transition {
            source: TestState::Stopped,
            target: TestState::Playing,
            event: TestEvent::Play,
            guard: Some(Guard::new(|ctx: &GuardContext<'_, TestState, TestEvent>| {
                ctx.variables.contains_key("disc")
            })),
            actions: Vec::new(),
            kind: TransitionKind::default(),
        };

        assert!(transition.is_guarded());
        assert!(guard_ctx_allows(&transition, &Variables::new().with("disc", 1)));
        assert!(!guard_ctx_allows(&transition, &Variables::new()));
        assert_eq!(transition.kind, TransitionKind::External);
    }
}
