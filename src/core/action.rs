//! Side-effecting hooks run on transitions and on state entry/exit.

use super::context::ActionContext;
use super::state::{Event, State};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error raised by an action hook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

type Hook<S, E> = dyn Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync;

/// A named side-effecting hook.
///
/// Actions are shared by every machine built from the same table, so the
/// hook itself is `Fn + Send + Sync`; per-machine data lives in the
/// extended state reachable through [`ActionContext::variables`].
///
/// # Panics
///
/// Hooks must report failure through [`ActionError`] and must not panic.
/// Entry and exit hooks run after the configuration change is committed, so
/// a panicking hook unwinds through [`Machine::send_event`] and leaves the
/// extended state partly updated, with the rest of the step never run.
///
/// [`Machine::send_event`]: crate::machine::Machine::send_event
pub struct Action<S: State, E: Event> {
    name: String,
    hook: Arc<Hook<S, E>>,
}

impl<S: State, E: Event> Action<S, E> {
    /// Create an action from a fallible hook.
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    /// Create an action from a hook that cannot fail.
    pub fn infallible<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        Self::new(name, move |ctx| {
            hook(ctx);
            Ok(())
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self, ctx: &mut ActionContext<'_, S, E>) -> Result<(), ActionError> {
        (self.hook)(ctx)
    }
}

impl<S: State, E: Event> Clone for Action<S, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<S: State, E: Event> fmt::Debug for Action<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Action").field(&self.name).finish()
    }
}
