//! Builder for constructing transition tables.

use crate::builder::error::ConfigurationError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{Event, State};
use crate::table::{StateDef, Transition, TransitionTable};
use std::sync::Arc;

/// Builder for constructing transition tables with a fluent API.
///
/// Problems in transition builders and in the table itself are collected
/// and reported together by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use statechart::builder::{simple_transition, TableBuilder};
/// use statechart::table::StateDef;
/// use statechart::{event_enum, state_enum};
///
/// state_enum! {
///     enum Player { Idle, Deck, Playing, Paused }
/// }
/// event_enum! {
///     enum Button { Play, Pause }
/// }
///
/// let table = TableBuilder::new()
///     .initial(Player::Idle)
///     .state(StateDef::new(Player::Idle))
///     .state(StateDef::new(Player::Deck))
///     .state(StateDef::new(Player::Playing).parent(Player::Deck).initial())
///     .state(StateDef::new(Player::Paused).parent(Player::Deck))
///     .add_transition(simple_transition(Player::Idle, Player::Deck, Button::Play))
///     .add_transition(simple_transition(Player::Playing, Player::Paused, Button::Pause))
///     .add_transition(simple_transition(Player::Paused, Player::Playing, Button::Play))
///     .build()
///     .unwrap();
///
/// assert!(table.is_composite(&Player::Deck));
/// ```
pub struct TableBuilder<S: State, E: Event> {
    initial: Option<S>,
    states: Vec<StateDef<S, E>>,
    transitions: Vec<PendingTransition<S, E>>,
}

/// Transitions keep the order they were added in, whichever API added them.
enum PendingTransition<S: State, E: Event> {
    Built(Transition<S, E>),
    Builder(TransitionBuilder<S, E>),
}

impl<S: State, E: Event> TableBuilder<S, E> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            states: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Set the top-level initial state.
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Declare a state.
    pub fn state(mut self, state: StateDef<S, E>) -> Self {
        self.states.push(state);
        self
    }

    /// Declare several states at once.
    pub fn states(mut self, states: impl IntoIterator<Item = StateDef<S, E>>) -> Self {
        self.states.extend(states);
        self
    }

    /// Add a transition using a builder; its problems surface at `build()`.
    pub fn transition(mut self, builder: TransitionBuilder<S, E>) -> Self {
        self.transitions.push(PendingTransition::Builder(builder));
        self
    }

    /// Add a pre-built transition.
    pub fn add_transition(mut self, transition: Transition<S, E>) -> Self {
        self.transitions.push(PendingTransition::Built(transition));
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = Transition<S, E>>) -> Self {
        self.transitions
            .extend(transitions.into_iter().map(PendingTransition::Built));
        self
    }

    /// Build the table.
    pub fn build(self) -> Result<TransitionTable<S, E>, ConfigurationError> {
        let mut violations = Vec::new();
        let mut transitions = Vec::with_capacity(self.transitions.len());

        for pending in self.transitions {
            match pending {
                PendingTransition::Built(transition) => transitions.push(transition),
                PendingTransition::Builder(builder) => match builder.build() {
                    Ok(transition) => transitions.push(transition),
                    Err(err) => violations.extend(err.into_violations()),
                },
            }
        }

        match TransitionTable::compile(self.states, transitions, self.initial) {
            Ok(table) if violations.is_empty() => Ok(table),
            Ok(_) => Err(ConfigurationError::new(violations)),
            Err(err) => {
                violations.extend(err.into_violations());
                Err(ConfigurationError::new(violations))
            }
        }
    }

    /// Build the table behind an `Arc`, ready to be shared by machines.
    pub fn build_shared(self) -> Result<Arc<TransitionTable<S, E>>, ConfigurationError> {
        self.build().map(Arc::new)
    }
}

impl<S: State, E: Event> Default for TableBuilder<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConfigViolation;

    crate::state_enum! {
        enum TestState { Idle, Deck, Playing, Paused }
    }

    crate::event_enum! {
        enum TestEvent { Play, Pause }
    }

    fn deck_states() -> Vec<StateDef<TestState, TestEvent>> {
        vec![
            StateDef::new(TestState::Idle),
            StateDef::new(TestState::Deck),
            StateDef::new(TestState::Playing).parent(TestState::Deck).initial(),
            StateDef::new(TestState::Paused).parent(TestState::Deck),
        ]
    }

    #[test]
    fn builder_requires_an_initial_state() {
        let result = TableBuilder::<TestState, TestEvent>::new()
            .states(deck_states())
            .build();

        let err = result.unwrap_err();
        assert_eq!(
            err.violations(),
            &[ConfigViolation::MissingRegionInitial {
                parent: None,
                region: None,
            }]
        );
    }

    #[test]
    fn builder_merges_transition_and_table_violations() {
        let err = TableBuilder::new()
            .states(deck_states())
            .transition(TransitionBuilder::new().from(TestState::Idle).on(TestEvent::Play))
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .to(TestState::Deck)
                    .on(TestEvent::Play),
            )
            .build()
            .unwrap_err();

        assert_eq!(
            err.violations(),
            &[
                ConfigViolation::MissingToState,
                ConfigViolation::MissingRegionInitial {
                    parent: None,
                    region: None,
                },
            ]
        );
    }

    #[test]
    fn transition_builder_violation_fails_an_otherwise_valid_table() {
        let err = TableBuilder::new()
            .initial(TestState::Idle)
            .states(deck_states())
            .transition(TransitionBuilder::new().to(TestState::Deck).on(TestEvent::Play))
            .build()
            .unwrap_err();

        assert_eq!(err.violations(), &[ConfigViolation::MissingFromState]);
    }

    #[test]
    fn fluent_api_builds_table() {
        let table = TableBuilder::new()
            .initial(TestState::Idle)
            .states(deck_states())
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .to(TestState::Deck)
                    .on(TestEvent::Play),
            )
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Playing)
                    .to(TestState::Paused)
                    .on(TestEvent::Pause),
            )
            .build_shared()
            .unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.transition_count(), 2);
    }

    #[test]
    fn transitions_keep_insertion_order_across_both_apis() {
        let table = TableBuilder::new()
            .initial(TestState::Idle)
            .states(deck_states())
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Idle)
                    .to(TestState::Deck)
                    .on(TestEvent::Play),
            )
            .add_transition(crate::builder::simple_transition(
                TestState::Playing,
                TestState::Paused,
                TestEvent::Pause,
            ))
            .transition(
                TransitionBuilder::new()
                    .from(TestState::Paused)
                    .to(TestState::Playing)
                    .on(TestEvent::Play),
            )
            .build()
            .unwrap();

        let sources: Vec<_> = (0..table.transition_count())
            .map(|t| table.id(table.transition(t).source).clone())
            .collect();
        assert_eq!(
            sources,
            vec![TestState::Idle, TestState::Playing, TestState::Paused]
        );
    }
}
