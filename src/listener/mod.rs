//! Listener registry for observing a running machine.
//!
//! Listeners are notified synchronously, on the dispatching thread, in
//! registration order. A failing listener never affects the dispatch or the
//! other listeners; its error is returned as a diagnostic.

use crate::core::{Event, State};
use crate::machine::DispatchError;
use crate::table::TransitionKind;
use std::fmt;
use std::sync::mpsc::Sender;
use thiserror::Error;
use uuid::Uuid;

/// Something that happened inside a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<S: State, E: Event> {
    StateExited(S),
    StateEntered(S),
    TransitionCompleted {
        source: S,
        target: S,
        event: E,
        kind: TransitionKind,
    },
    EventNotAccepted(E),
    MachineCompleted,
}

/// Error raised by a listener.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Receives machine notifications.
///
/// Closures of the form `FnMut(&Notification<S, E>) -> Result<(), ListenerError>`
/// implement this trait.
pub trait Listener<S: State, E: Event>: Send {
    fn notify(&mut self, notification: &Notification<S, E>) -> Result<(), ListenerError>;
}

impl<S, E, F> Listener<S, E> for F
where
    S: State,
    E: Event,
    F: FnMut(&Notification<S, E>) -> Result<(), ListenerError> + Send,
{
    fn notify(&mut self, notification: &Notification<S, E>) -> Result<(), ListenerError> {
        self(notification)
    }
}

/// Forwards notifications into a channel for asynchronous consumers.
///
/// Once the receiving side is dropped every notification fails with a
/// [`ListenerError`].
pub struct ChannelListener<S: State, E: Event> {
    sender: Sender<Notification<S, E>>,
}

impl<S: State, E: Event> ChannelListener<S, E> {
    pub fn new(sender: Sender<Notification<S, E>>) -> Self {
        Self { sender }
    }
}

impl<S: State, E: Event> Listener<S, E> for ChannelListener<S, E> {
    fn notify(&mut self, notification: &Notification<S, E>) -> Result<(), ListenerError> {
        self.sender
            .send(notification.clone())
            .map_err(|_| ListenerError::new("notification channel closed"))
    }
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered mapping from subscription handle to listener.
pub(crate) struct ListenerRegistry<S: State, E: Event> {
    listeners: Vec<(SubscriptionId, Box<dyn Listener<S, E>>)>,
}

impl<S: State, E: Event> ListenerRegistry<S, E> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub(crate) fn subscribe(&mut self, listener: Box<dyn Listener<S, E>>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver each notification to every listener, collecting failures.
    pub(crate) fn notify_all(&mut self, notifications: &[Notification<S, E>]) -> Vec<DispatchError> {
        let mut errors = Vec::new();
        for notification in notifications {
            for (id, listener) in self.listeners.iter_mut() {
                if let Err(err) = listener.notify(notification) {
                    tracing::warn!(subscription = %id, error = %err, "listener failed");
                    errors.push(DispatchError::Listener {
                        subscription: id.to_string(),
                        message: err.message().to_string(),
                    });
                }
            }
        }
        errors
    }
}

impl<S: State, E: Event> fmt::Debug for ListenerRegistry<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
