//! Builder API for ergonomic table construction.
//!
//! This module provides fluent builders and macros for declaring state
//! machines with minimal boilerplate while keeping every problem in a
//! definition visible at build time.

pub mod error;
pub mod macros;
pub mod table;
pub mod transition;

pub use error::{ConfigViolation, ConfigurationError};
pub use table::TableBuilder;
pub use transition::TransitionBuilder;

use crate::core::{Event, GuardContext, State};
use crate::table::{Transition, TransitionKind};
use thiserror::Error;

/// Error returned when parsing an event name that does not exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown event '{name}'")]
pub struct UnknownEvent {
    name: String,
}

impl UnknownEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Create an unguarded external transition without actions.
///
/// # Example
///
/// ```
/// use statechart::builder::simple_transition;
/// use statechart::{event_enum, state_enum};
///
/// state_enum! {
///     enum MyState { Start, End }
/// }
/// event_enum! {
///     enum MyEvent { Go }
/// }
///
/// let transition = simple_transition(MyState::Start, MyState::End, MyEvent::Go);
/// assert!(!transition.is_guarded());
/// ```
pub fn simple_transition<S: State, E: Event>(from: S, to: S, event: E) -> Transition<S, E> {
    Transition {
        source: from,
        target: to,
        event,
        guard: None,
        actions: Vec::new(),
        kind: TransitionKind::External,
    }
}

/// Create an external transition with a guard predicate.
///
/// # Example
///
/// ```
/// use statechart::builder::guarded_transition;
/// use statechart::{event_enum, state_enum};
///
/// state_enum! {
///     enum MyState { Start, End }
/// }
/// event_enum! {
///     enum MyEvent { Go }
/// }
///
/// let transition = guarded_transition(MyState::Start, MyState::End, MyEvent::Go, |ctx| {
///     ctx.variables.contains_key("ready")
/// });
/// assert!(transition.is_guarded());
/// ```
pub fn guarded_transition<S, E, F>(from: S, to: S, event: E, guard: F) -> Transition<S, E>
where
    S: State,
    E: Event,
    F: Fn(&GuardContext<'_, S, E>) -> bool + Send + Sync + 'static,
{
    Transition {
        guard: Some(crate::core::Guard::new(guard)),
        ..simple_transition(from, to, event)
    }
}
