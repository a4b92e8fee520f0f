//! Guard predicates for controlling transitions.
//!
//! Guards are pure boolean functions that decide whether a transition is
//! eligible for the event being dispatched. The dispatcher may evaluate a
//! guard several times while it searches for a transition, so guards must
//! not have side effects.

use super::context::GuardContext;
use super::state::{Event, State};
use std::fmt;
use std::sync::Arc;

type Predicate<S, E> = dyn Fn(&GuardContext<'_, S, E>) -> bool + Send + Sync;

/// Pure predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use statechart::core::{Guard, GuardContext, Variables};
/// use statechart::{event_enum, state_enum};
///
/// state_enum! {
///     enum Deck { Stopped, Playing }
/// }
/// event_enum! {
///     enum Button { Play }
/// }
///
/// let has_disc = Guard::new(|ctx: &GuardContext<'_, Deck, Button>| {
///     ctx.variables.get_as::<bool>("disc").unwrap_or(false)
/// });
///
/// let variables = Variables::new().with("disc", true);
/// let headers = Variables::new();
/// let ctx = GuardContext {
///     event: &Button::Play,
///     source: &Deck::Stopped,
///     target: &Deck::Playing,
///     headers: &headers,
///     variables: &variables,
/// };
/// assert!(has_disc.check(&ctx));
/// ```
pub struct Guard<S: State, E: Event> {
    predicate: Arc<Predicate<S, E>>,
}

impl<S: State, E: Event> Guard<S, E> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic, free of side effects and
    /// thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&GuardContext<'_, S, E>) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard allows the transition.
    pub fn check(&self, ctx: &GuardContext<'_, S, E>) -> bool {
        (self.predicate)(ctx)
    }

    /// Guard passing only when both guards pass.
    pub fn and(self, other: Guard<S, E>) -> Self {
        Guard::new(move |ctx| self.check(ctx) && other.check(ctx))
    }

    /// Guard passing when either guard passes.
    pub fn or(self, other: Guard<S, E>) -> Self {
        Guard::new(move |ctx| self.check(ctx) || other.check(ctx))
    }

    /// Guard passing when this one does not.
    pub fn negate(self) -> Self {
        Guard::new(move |ctx| !self.check(ctx))
    }
}

impl<S: State, E: Event> Clone for Guard<S, E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S: State, E: Event> fmt::Debug for Guard<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
