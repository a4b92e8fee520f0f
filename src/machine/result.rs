//! Results of dispatching an event.

use crate::core::{Event, State};
use serde::Serialize;
use thiserror::Error;

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DispatchOutcome {
    /// At least one transition fired and was committed.
    Accepted,
    /// No transition matched; nothing changed.
    Rejected,
    /// No transition matched, but an active state defers the event. It is
    /// retried after the next accepted transition.
    Deferred,
    /// A transition was selected but could not be carried out; nothing was
    /// committed. See the diagnostics.
    Failed,
}

/// Problems reported alongside a dispatch result.
///
/// None of these escape as `Err`; they are collected so the caller can
/// finish its own work and surface them separately.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum DispatchError {
    /// Several transitions were eligible for the same active state.
    #[error("Event '{event}' is ambiguous in state '{state}': {candidates} transitions are eligible")]
    Ambiguous {
        state: String,
        event: String,
        candidates: usize,
    },

    /// A transition action failed; the dispatch was abandoned.
    #[error("Action '{action}' of transition '{source_state}' -> '{target}' on '{event}' failed: {message}")]
    ActionFailed {
        source_state: String,
        target: String,
        event: String,
        action: String,
        message: String,
    },

    /// An entry or exit action failed after the transition was committed.
    #[error("{phase} action '{action}' of state '{state}' failed: {message}")]
    StateActionFailed {
        state: String,
        phase: HookPhase,
        action: String,
        message: String,
    },

    /// A listener returned an error; other listeners were still notified.
    #[error("Listener {subscription} failed: {message}")]
    Listener {
        subscription: String,
        message: String,
    },
}

/// Which state hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HookPhase {
    Entry,
    Exit,
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => f.write_str("Entry"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

/// Result of one `send_event` call.
#[derive(Debug, Clone)]
pub struct DispatchResult<S: State, E: Event> {
    pub event: E,
    pub outcome: DispatchOutcome,
    /// Active states after this event was processed, in declaration order.
    pub active_states: Vec<S>,
    pub diagnostics: Vec<DispatchError>,
    /// Results of events queued by actions, and of deferred events retried,
    /// in the order they were processed.
    pub chained: Vec<DispatchResult<S, E>>,
}

impl<S: State, E: Event> DispatchResult<S, E> {
    pub fn accepted(&self) -> bool {
        self.outcome == DispatchOutcome::Accepted
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == DispatchOutcome::Failed
    }

    /// Diagnostics of this result and of every chained result.
    pub fn all_diagnostics(&self) -> Vec<&DispatchError> {
        self.diagnostics
            .iter()
            .chain(self.chained.iter().flat_map(|c| c.all_diagnostics()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::state_enum! {
        enum TestState { Idle }
    }

    crate::event_enum! {
        enum TestEvent { Play, Stop }
    }

    #[test]
    fn diagnostics_are_collected_through_chained_results() {
        let listener = DispatchError::Listener {
            subscription: "sub".to_string(),
            message: "gone".to_string(),
        };
        let hook = DispatchError::StateActionFailed {
            state: "Idle".to_string(),
            phase: HookPhase::Entry,
            action: "greet".to_string(),
            message: "boom".to_string(),
        };

        let result = DispatchResult {
            event: TestEvent::Play,
            outcome: DispatchOutcome::Accepted,
            active_states: vec![TestState::Idle],
            diagnostics: vec![listener.clone()],
            chained: vec![DispatchResult {
                event: TestEvent::Stop,
                outcome: DispatchOutcome::Rejected,
                active_states: vec![TestState::Idle],
                diagnostics: vec![hook.clone()],
                chained: Vec::new(),
            }],
        };

        assert!(result.accepted());
        assert!(!result.chained[0].accepted());
        assert_eq!(result.all_diagnostics(), vec![&listener, &hook]);
    }

    #[test]
    fn errors_render_readably() {
        let err = DispatchError::Ambiguous {
            state: "Playing".to_string(),
            event: "Pause".to_string(),
            candidates: 2,
        };
        assert_eq!(
            err.to_string(),
            "Event 'Pause' is ambiguous in state 'Playing': 2 transitions are eligible"
        );

        let hook = DispatchError::StateActionFailed {
            state: "Deck".to_string(),
            phase: HookPhase::Exit,
            action: "spin down".to_string(),
            message: "stuck".to_string(),
        };
        assert_eq!(
            hook.to_string(),
            "Exit action 'spin down' of state 'Deck' failed: stuck"
        );
    }
}
