//! Core state machine types.
//!
//! This module contains the building blocks shared by the table, the
//! dispatcher and user code:
//! - State and event identifiers via the `State` and `Event` traits
//! - Guard predicates for transition control
//! - Actions run on transitions and on state entry/exit
//! - The contexts guards and actions receive

mod action;
mod context;
mod guard;
mod state;

pub use action::{Action, ActionError};
pub use context::{ActionContext, ActionScope, GuardContext, Variables};
pub(crate) use context::PendingEvent;
pub use guard::Guard;
pub use state::{Event, State};
