//! Statechart: a hierarchical state machine engine
//!
//! A machine is described once as an immutable [`TransitionTable`] and run
//! by any number of [`Machine`] instances. Tables support nested states,
//! orthogonal regions, guarded transitions, entry/exit and transition
//! actions, deferred events and final states. Every problem in a definition
//! is reported together when the table is built.
//!
//! # Core Concepts
//!
//! - **State / Event**: closed sets of identifiers via the `State` and
//!   `Event` traits (or the `state_enum!` and `event_enum!` macros)
//! - **Transition Table**: validated hierarchy, regions and transitions
//! - **Machine**: active configuration, extended state and listeners
//! - **Dispatch**: `send_event` selects, runs and commits transitions
//!   atomically and reports the outcome
//! - **Listeners**: synchronous notification of entries, exits and
//!   completed transitions
//! - **Checkpoint**: JSON or binary snapshot of a running machine
//!
//! # Example
//!
//! ```rust
//! use statechart::builder::{TableBuilder, TransitionBuilder};
//! use statechart::{event_enum, state_enum, DispatchOutcome, Machine, StateDef};
//!
//! state_enum! {
//!     enum CdPlayer { Idle, Deck, Playing, Paused }
//! }
//! event_enum! {
//!     enum CdEvent { Play, Pause, Stop }
//! }
//!
//! let table = TableBuilder::new()
//!     .initial(CdPlayer::Idle)
//!     .state(StateDef::new(CdPlayer::Idle))
//!     .state(StateDef::new(CdPlayer::Deck))
//!     .state(StateDef::new(CdPlayer::Playing).parent(CdPlayer::Deck).initial())
//!     .state(StateDef::new(CdPlayer::Paused).parent(CdPlayer::Deck))
//!     .transition(TransitionBuilder::new().from(CdPlayer::Idle).to(CdPlayer::Deck).on(CdEvent::Play))
//!     .transition(TransitionBuilder::new().from(CdPlayer::Playing).to(CdPlayer::Paused).on(CdEvent::Pause))
//!     .transition(TransitionBuilder::new().from(CdPlayer::Paused).to(CdPlayer::Playing).on(CdEvent::Play))
//!     .transition(TransitionBuilder::new().from(CdPlayer::Deck).to(CdPlayer::Idle).on(CdEvent::Stop))
//!     .build_shared()
//!     .unwrap();
//!
//! let mut machine = Machine::new(table);
//!
//! // PAUSE means nothing while idle.
//! assert_eq!(machine.send_event(CdEvent::Pause).outcome, DispatchOutcome::Rejected);
//!
//! machine.send_event(CdEvent::Play);
//! machine.send_event(CdEvent::Pause);
//! assert_eq!(machine.current_states(), vec![CdPlayer::Deck, CdPlayer::Paused]);
//!
//! machine.send_event(CdEvent::Stop);
//! assert_eq!(machine.current_states(), vec![CdPlayer::Idle]);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod listener;
pub mod machine;
pub mod table;

// Re-export commonly used types
pub use builder::{ConfigViolation, ConfigurationError, TableBuilder, TransitionBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{Action, ActionContext, ActionError, Event, Guard, GuardContext, State, Variables};
pub use listener::{ChannelListener, Listener, ListenerError, Notification, SubscriptionId};
pub use machine::{DispatchError, DispatchOutcome, DispatchResult, Machine};
pub use table::{StateDef, Transition, TransitionKind, TransitionTable};
