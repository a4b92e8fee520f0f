//! Running state machines.
//!
//! A [`Machine`] owns one active configuration, its extended state and its
//! listeners. The [`TransitionTable`] it runs is shared and never mutated.
//!
//! # Example
//!
//! ```rust
//! use statechart::builder::{TableBuilder, TransitionBuilder};
//! use statechart::machine::{DispatchOutcome, Machine};
//! use statechart::table::StateDef;
//! use statechart::{event_enum, state_enum};
//!
//! state_enum! {
//!     enum Player { Idle, Deck, Playing, Paused }
//! }
//! event_enum! {
//!     enum Button { Play, Pause }
//! }
//!
//! let table = TableBuilder::new()
//!     .initial(Player::Idle)
//!     .state(StateDef::new(Player::Idle))
//!     .state(StateDef::new(Player::Deck))
//!     .state(StateDef::new(Player::Playing).parent(Player::Deck).initial())
//!     .state(StateDef::new(Player::Paused).parent(Player::Deck))
//!     .transition(TransitionBuilder::new().from(Player::Idle).to(Player::Deck).on(Button::Play))
//!     .transition(TransitionBuilder::new().from(Player::Playing).to(Player::Paused).on(Button::Pause))
//!     .build_shared()
//!     .unwrap();
//!
//! let mut machine = Machine::new(table);
//! assert_eq!(machine.send_event(Button::Pause).outcome, DispatchOutcome::Rejected);
//!
//! let result = machine.send_event(Button::Play);
//! assert!(result.accepted());
//! assert_eq!(result.active_states, vec![Player::Deck, Player::Playing]);
//! ```

mod configuration;
mod dispatch;
mod evaluator;
mod result;

pub use result::{DispatchError, DispatchOutcome, DispatchResult, HookPhase};

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::core::{ActionContext, ActionScope, Event, PendingEvent, State, Variables};
use crate::listener::{Listener, ListenerRegistry, Notification, SubscriptionId};
use crate::table::{StateIdx, TransitionKind, TransitionTable};
use configuration::StateConfiguration;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// One running instance of a transition table.
pub struct Machine<S: State, E: Event> {
    table: Arc<TransitionTable<S, E>>,
    configuration: StateConfiguration,
    variables: Variables,
    listeners: ListenerRegistry<S, E>,
    deferred: VecDeque<PendingEvent<E>>,
    startup_diagnostics: Vec<DispatchError>,
    complete: bool,
}

impl<S: State, E: Event> Machine<S, E> {
    /// Create a machine and enter its initial configuration.
    ///
    /// Entry actions of the initial states run here. Their failures, and
    /// the results of any events they queue, are kept in
    /// [`startup_diagnostics`](Self::startup_diagnostics).
    pub fn new(table: Arc<TransitionTable<S, E>>) -> Self {
        Self::with_variables(table, Variables::new())
    }

    /// Create a machine with pre-populated extended state.
    pub fn with_variables(table: Arc<TransitionTable<S, E>>, variables: Variables) -> Self {
        let mut machine = Self::idle(table, StateConfiguration::new(), variables);

        let entered = machine.configuration.enter_initial(machine.table.as_ref());
        let mut queued = VecDeque::new();
        let mut diagnostics = Vec::new();
        dispatch::run_state_hooks(
            machine.table.as_ref(),
            &entered,
            HookPhase::Entry,
            None,
            &Variables::new(),
            &mut machine.variables,
            &mut queued,
            &mut diagnostics,
        );
        machine.complete = machine.reached_final();
        tracing::debug!(
            states = ?machine.current_states(),
            "entered initial configuration"
        );

        for result in machine.drain(queued) {
            diagnostics.extend(result.all_diagnostics().into_iter().cloned());
        }
        machine.startup_diagnostics = diagnostics;
        machine
    }

    /// Rebuild a machine from a checkpoint taken on the same table.
    ///
    /// No entry actions run; the machine resumes exactly where the
    /// checkpoint left it.
    pub fn restore(
        table: Arc<TransitionTable<S, E>>,
        checkpoint: Checkpoint<S>,
    ) -> Result<Self, CheckpointError> {
        checkpoint.check_version()?;

        let mut active = Vec::with_capacity(checkpoint.active_states.len());
        for state in &checkpoint.active_states {
            let idx = table
                .idx_of(state)
                .ok_or_else(|| CheckpointError::UnknownState(state.name().to_string()))?;
            active.push(idx);
        }

        let configuration = StateConfiguration::from_indices(active);
        if !configuration.is_consistent(&table) {
            return Err(CheckpointError::ValidationFailed(
                "active states do not form a valid configuration".to_string(),
            ));
        }

        let mut machine = Self::idle(table, configuration, checkpoint.variables);
        machine.complete = machine.reached_final();
        tracing::debug!(
            checkpoint = %checkpoint.id,
            states = ?machine.current_states(),
            "restored machine"
        );
        Ok(machine)
    }

    fn idle(
        table: Arc<TransitionTable<S, E>>,
        configuration: StateConfiguration,
        variables: Variables,
    ) -> Self {
        Self {
            table,
            configuration,
            variables,
            listeners: ListenerRegistry::new(),
            deferred: VecDeque::new(),
            startup_diagnostics: Vec::new(),
            complete: false,
        }
    }

    /// Send an event without headers.
    pub fn send_event(&mut self, event: E) -> DispatchResult<S, E> {
        self.send_event_with(event, Variables::new())
    }

    /// Send an event with headers and process everything it causes.
    ///
    /// Events queued by actions, and deferred events released by an accepted
    /// transition, are dispatched before this returns; their results are in
    /// [`DispatchResult::chained`].
    pub fn send_event_with(&mut self, event: E, headers: Variables) -> DispatchResult<S, E> {
        let mut queued = VecDeque::new();
        let mut result = self.dispatch(event, headers, &mut queued);
        result.chained = self.drain(queued);
        result
    }

    fn drain(&mut self, mut queued: VecDeque<PendingEvent<E>>) -> Vec<DispatchResult<S, E>> {
        let mut results = Vec::new();
        while let Some(pending) = queued.pop_front() {
            results.push(self.dispatch(pending.event, pending.headers, &mut queued));
        }
        results
    }

    /// Process one event. Follow-up events go into `queued`.
    fn dispatch(
        &mut self,
        event: E,
        headers: Variables,
        queued: &mut VecDeque<PendingEvent<E>>,
    ) -> DispatchResult<S, E> {
        let shared = Arc::clone(&self.table);
        let table = shared.as_ref();

        if self.complete {
            tracing::debug!(event = event.name(), "machine complete, event rejected");
            return self.not_accepted(event, DispatchOutcome::Rejected);
        }

        let selected = match dispatch::select(
            table,
            &self.configuration,
            &event,
            &headers,
            &self.variables,
        ) {
            Ok(selected) => selected,
            Err(err) => {
                tracing::warn!(event = event.name(), error = %err, "dispatch failed");
                return self.finish(event, DispatchOutcome::Failed, vec![err]);
            }
        };

        if selected.is_empty() {
            if self.defers(&event) {
                tracing::debug!(event = event.name(), "event deferred");
                self.deferred.push_back(PendingEvent { event: event.clone(), headers });
                return self.finish(event, DispatchOutcome::Deferred, Vec::new());
            }
            tracing::debug!(event = event.name(), "event rejected");
            return self.not_accepted(event, DispatchOutcome::Rejected);
        }

        // Transition actions run against staged copies; nothing is
        // committed unless every one of them succeeds.
        let mut staged = self.variables.clone();
        let mut follow_ups = VecDeque::new();
        for &t in &selected {
            let transition = table.transition(t);
            let source = table.id(transition.source);
            let target = table.id(transition.target);
            let mut ctx = ActionContext {
                event: Some(&event),
                scope: ActionScope::Transition { source, target },
                headers: &headers,
                variables: &mut staged,
                queued: &mut follow_ups,
            };
            if let Err(failed) = evaluator::run_actions(&transition.actions, &mut ctx) {
                tracing::warn!(
                    event = event.name(),
                    source = source.name(),
                    target = target.name(),
                    action = %failed.name,
                    index = failed.index,
                    error = %failed.error,
                    "transition action failed, nothing committed"
                );
                let err = DispatchError::ActionFailed {
                    source_state: source.name().to_string(),
                    target: target.name().to_string(),
                    event: event.name().to_string(),
                    action: failed.name,
                    message: failed.error.message().to_string(),
                };
                return self.finish(event, DispatchOutcome::Failed, vec![err]);
            }
        }
        self.variables = staged;

        let mut diagnostics = Vec::new();
        let mut notifications = Vec::new();
        for &t in &selected {
            let transition = table.transition(t);

            let mut exited: Vec<StateIdx> = Vec::new();
            for root in dispatch::exit_roots(table, &self.configuration, transition) {
                exited.extend(self.configuration.exit(table, root));
            }
            dispatch::run_state_hooks(
                table,
                &exited,
                HookPhase::Exit,
                Some(&event),
                &headers,
                &mut self.variables,
                &mut follow_ups,
                &mut diagnostics,
            );

            let entered = if transition.kind == TransitionKind::Internal {
                Vec::new()
            } else {
                self.configuration.enter(table, transition.target)
            };
            dispatch::run_state_hooks(
                table,
                &entered,
                HookPhase::Entry,
                Some(&event),
                &headers,
                &mut self.variables,
                &mut follow_ups,
                &mut diagnostics,
            );

            let source = table.id(transition.source).clone();
            let target = table.id(transition.target).clone();
            tracing::debug!(
                event = event.name(),
                source = source.name(),
                target = target.name(),
                kind = ?transition.kind,
                exited = exited.len(),
                entered = entered.len(),
                "transition committed"
            );

            notifications.extend(
                exited
                    .iter()
                    .map(|&idx| Notification::StateExited(table.id(idx).clone())),
            );
            notifications.push(Notification::TransitionCompleted {
                source,
                target,
                event: event.clone(),
                kind: transition.kind,
            });
            notifications.extend(
                entered
                    .iter()
                    .map(|&idx| Notification::StateEntered(table.id(idx).clone())),
            );
        }

        if self.reached_final() {
            self.complete = true;
            tracing::info!(states = ?self.current_states(), "machine completed");
            notifications.push(Notification::MachineCompleted);
        }
        diagnostics.extend(self.listeners.notify_all(&notifications));

        // Deferred events get another chance before anything the actions queued.
        queued.extend(follow_ups);
        while let Some(pending) = self.deferred.pop_back() {
            queued.push_front(pending);
        }

        self.finish(event, DispatchOutcome::Accepted, diagnostics)
    }

    fn not_accepted(&mut self, event: E, outcome: DispatchOutcome) -> DispatchResult<S, E> {
        let diagnostics = self
            .listeners
            .notify_all(&[Notification::EventNotAccepted(event.clone())]);
        self.finish(event, outcome, diagnostics)
    }

    fn finish(
        &self,
        event: E,
        outcome: DispatchOutcome,
        diagnostics: Vec<DispatchError>,
    ) -> DispatchResult<S, E> {
        DispatchResult {
            event,
            outcome,
            active_states: self.current_states(),
            diagnostics,
            chained: Vec::new(),
        }
    }

    fn defers(&self, event: &E) -> bool {
        self.configuration
            .iter()
            .any(|idx| self.table.node(idx).deferred.contains(event))
    }

    fn reached_final(&self) -> bool {
        self.table.root_regions().iter().all(|region| {
            region
                .members
                .iter()
                .any(|&m| self.configuration.is_active(m) && self.table.node(m).is_final)
        })
    }

    /// Active states in declaration order.
    pub fn current_states(&self) -> Vec<S> {
        self.configuration.active_states(&self.table)
    }

    /// Active states with no active children, in declaration order.
    pub fn active_leaves(&self) -> Vec<S> {
        self.configuration
            .leaves(&self.table)
            .into_iter()
            .map(|idx| self.table.id(idx).clone())
            .collect()
    }

    pub fn is_active(&self, state: &S) -> bool {
        self.table
            .idx_of(state)
            .is_some_and(|idx| self.configuration.is_active(idx))
    }

    /// True once every top-level region rests in a final state.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The extended state.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    /// Events waiting for a state that accepts them, oldest first.
    pub fn deferred_events(&self) -> Vec<E> {
        self.deferred.iter().map(|p| p.event.clone()).collect()
    }

    pub fn table(&self) -> &Arc<TransitionTable<S, E>> {
        &self.table
    }

    /// Problems raised while entering the initial configuration.
    pub fn startup_diagnostics(&self) -> &[DispatchError] {
        &self.startup_diagnostics
    }

    pub fn subscribe<L>(&mut self, listener: L) -> SubscriptionId
    where
        L: Listener<S, E> + 'static,
    {
        self.listeners.subscribe(Box::new(listener))
    }

    /// Remove a listener. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot the active configuration and extended state.
    pub fn checkpoint(&self) -> Checkpoint<S> {
        Checkpoint::new(self.current_states(), self.variables.clone())
    }
}

impl<S: State, E: Event> fmt::Debug for Machine<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("active", &self.current_states())
            .field("variables", &self.variables)
            .field("deferred", &self.deferred_events())
            .field("listeners", &self.listeners)
            .field("complete", &self.complete)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{TableBuilder, TransitionBuilder};
    use crate::core::ActionError;
    use crate::table::StateDef;

    crate::state_enum! {
        enum Player { Idle, Deck, Playing, Paused, Off }
    }

    crate::event_enum! {
        enum Button { Play, Pause, Stop, PowerOff }
    }

    fn player() -> Arc<TransitionTable<Player, Button>> {
        TableBuilder::new()
            .initial(Player::Idle)
            .state(StateDef::new(Player::Idle))
            .state(StateDef::new(Player::Deck))
            .state(StateDef::new(Player::Playing).parent(Player::Deck).initial())
            .state(StateDef::new(Player::Paused).parent(Player::Deck))
            .state(StateDef::new(Player::Off).final_state())
            .transition(TransitionBuilder::new().from(Player::Idle).to(Player::Deck).on(Button::Play))
            .transition(
                TransitionBuilder::new()
                    .from(Player::Playing)
                    .to(Player::Paused)
                    .on(Button::Pause),
            )
            .transition(
                TransitionBuilder::new()
                    .from(Player::Paused)
                    .to(Player::Playing)
                    .on(Button::Play),
            )
            .transition(TransitionBuilder::new().from(Player::Deck).to(Player::Idle).on(Button::Stop))
            .transition(
                TransitionBuilder::new()
                    .from(Player::Idle)
                    .to(Player::Off)
                    .on(Button::PowerOff),
            )
            .build_shared()
            .unwrap()
    }

    #[test]
    #[should_panic(expected = "tray motor seized")]
    fn panicking_entry_hook_unwinds_through_send_event() {
        let table = TableBuilder::<Player, Button>::new()
            .initial(Player::Idle)
            .state(StateDef::new(Player::Idle))
            .state(StateDef::new(Player::Deck).entry_fn("spin up", |_| panic!("tray motor seized")))
            .state(StateDef::new(Player::Playing).parent(Player::Deck).initial())
            .transition(TransitionBuilder::new().from(Player::Idle).to(Player::Deck).on(Button::Play))
            .build_shared()
            .unwrap();
        let mut machine = Machine::new(table);

        machine.send_event(Button::Play);
    }

    #[test]
    fn new_machine_rests_in_initial_configuration() {
        let machine = Machine::new(player());

        assert_eq!(machine.current_states(), vec![Player::Idle]);
        assert!(machine.startup_diagnostics().is_empty());
        assert!(!machine.is_complete());
    }

    #[test]
    fn play_pause_play_moves_through_deck() {
        let mut machine = Machine::new(player());

        let results: Vec<Vec<Player>> = [Button::Play, Button::Pause, Button::Play]
            .into_iter()
            .map(|event| machine.send_event(event).active_states)
            .collect();

        assert_eq!(
            results,
            vec![
                vec![Player::Deck, Player::Playing],
                vec![Player::Deck, Player::Paused],
                vec![Player::Deck, Player::Playing],
            ]
        );
        assert_eq!(machine.active_leaves(), vec![Player::Playing]);
    }

    #[test]
    fn rejected_event_changes_nothing() {
        let mut machine = Machine::new(player());

        let result = machine.send_event(Button::Pause);

        assert_eq!(result.outcome, DispatchOutcome::Rejected);
        assert_eq!(result.active_states, vec![Player::Idle]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn ancestor_transition_exits_whole_subtree() {
        let mut machine = Machine::new(player());
        machine.send_event(Button::Play);
        machine.send_event(Button::Pause);

        let result = machine.send_event(Button::Stop);

        assert!(result.accepted());
        assert_eq!(result.active_states, vec![Player::Idle]);
    }

    #[test]
    fn reaching_a_final_state_completes_the_machine() {
        let mut machine = Machine::new(player());

        assert!(machine.send_event(Button::PowerOff).accepted());
        assert!(machine.is_complete());

        let after = machine.send_event(Button::Play);
        assert_eq!(after.outcome, DispatchOutcome::Rejected);
        assert_eq!(after.active_states, vec![Player::Off]);
    }

    #[test]
    fn failing_entry_action_at_startup_is_reported() {
        let table = TableBuilder::<Player, Button>::new()
            .initial(Player::Idle)
            .state(
                StateDef::new(Player::Idle)
                    .try_entry_fn("load disc", |_| Err(ActionError::new("tray jammed"))),
            )
            .build_shared()
            .unwrap();

        let machine = Machine::new(table);

        assert_eq!(machine.current_states(), vec![Player::Idle]);
        assert_eq!(
            machine.startup_diagnostics(),
            &[DispatchError::StateActionFailed {
                state: "Idle".to_string(),
                phase: HookPhase::Entry,
                action: "load disc".to_string(),
                message: "tray jammed".to_string(),
            }]
        );
    }

    #[test]
    fn events_queued_at_startup_are_dispatched() {
        let table = TableBuilder::<Player, Button>::new()
            .initial(Player::Idle)
            .state(StateDef::new(Player::Idle).entry_fn("autoplay", |ctx| {
                ctx.send_event(Button::Play);
            }))
            .state(StateDef::new(Player::Deck))
            .state(StateDef::new(Player::Playing).parent(Player::Deck).initial())
            .transition(TransitionBuilder::new().from(Player::Idle).to(Player::Deck).on(Button::Play))
            .build_shared()
            .unwrap();

        let machine = Machine::new(table);

        assert_eq!(machine.current_states(), vec![Player::Deck, Player::Playing]);
    }

    #[test]
    fn variables_survive_and_are_mutable() {
        let mut machine = Machine::with_variables(player(), Variables::new().with("volume", 3));
        machine.variables_mut().insert("volume", 5);

        assert_eq!(machine.variables().get_as::<u8>("volume"), Some(5));
    }
}
