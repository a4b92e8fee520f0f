//! State descriptors.

use crate::core::{Action, ActionContext, ActionError, Event, State};

/// Declaration of one state of the hierarchy.
///
/// A state becomes composite as soon as another state names it as parent.
/// Children that share a `region` name form one orthogonal region; children
/// without a region name form the default region.
///
/// # Example
///
/// ```rust
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
/// let playing: StateDef<Player, Button> = StateDef::new(Player::Playing)
///     .parent(Player::Deck)
///     .initial();
/// assert!(playing.is_initial());
/// ```
#[derive(Debug, Clone)]
pub struct StateDef<S: State, E: Event> {
    pub(crate) id: S,
    pub(crate) parent: Option<S>,
    pub(crate) region: Option<String>,
    pub(crate) initial: bool,
    pub(crate) is_final: bool,
    pub(crate) entry: Vec<Action<S, E>>,
    pub(crate) exit: Vec<Action<S, E>>,
    pub(crate) deferred: Vec<E>,
}

impl<S: State, E: Event> StateDef<S, E> {
    pub fn new(id: S) -> Self {
        Self {
            id,
            parent: None,
            region: None,
            initial: false,
            is_final: false,
            entry: Vec::new(),
            exit: Vec::new(),
            deferred: Vec::new(),
        }
    }

    /// Nest this state inside `parent`.
    pub fn parent(mut self, parent: S) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Place this state in a named orthogonal region of its parent.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Mark this state as the initial member of its region.
    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    /// Mark this state as final.
    pub fn final_state(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Add an entry action; entry actions run in declaration order.
    pub fn on_entry(mut self, action: Action<S, E>) -> Self {
        self.entry.push(action);
        self
    }

    /// Add an exit action; exit actions run in declaration order.
    pub fn on_exit(mut self, action: Action<S, E>) -> Self {
        self.exit.push(action);
        self
    }

    /// Shorthand for an infallible entry action.
    pub fn entry_fn<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.on_entry(Action::infallible(name, hook))
    }

    /// Shorthand for an infallible exit action.
    pub fn exit_fn<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) + Send + Sync + 'static,
    {
        self.on_exit(Action::infallible(name, hook))
    }

    /// Shorthand for a fallible entry action.
    pub fn try_entry_fn<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, S, E>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.on_entry(Action::new(name, hook))
    }

    /// Postpone `event` while this state is active and nothing accepts it.
    pub fn defer(mut self, event: E) -> Self {
        if !self.deferred.contains(&event) {
            self.deferred.push(event);
        }
        self
    }

    pub fn id(&self) -> &S {
        &self.id
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }
}
