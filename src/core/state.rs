//! Identifier traits for states and events.
//!
//! States and events are values from a closed set, usually fieldless enums.
//! The [`state_enum!`](crate::state_enum) and [`event_enum!`](crate::event_enum)
//! macros derive both traits for such enums.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state identifiers.
///
/// A state identifier names a node of the state hierarchy. Hierarchy,
/// regions and flags are not part of the identifier; they are declared
/// when the [`TransitionTable`](crate::table::TransitionTable) is built.
///
/// # Required Traits
///
/// - `Clone` + `Eq` + `Hash`: identifiers are used as table keys
/// - `Debug`: identifiers appear in diagnostics
/// - `Serialize` + `Deserialize`: identifiers are stored in checkpoints
///
/// # Example
///
/// ```rust
/// use statechart::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
/// enum PlayerState {
///     Idle,
///     Playing,
/// }
///
/// impl State for PlayerState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Playing => "Playing",
///         }
///     }
/// }
///
/// assert_eq!(PlayerState::Playing.name(), "Playing");
/// ```
pub trait State:
    Clone + Eq + Hash + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Get the state's name for display/logging.
    fn name(&self) -> &str;
}

/// Trait for event identifiers.
///
/// Events carry no payload of their own. Data travels alongside an event
/// as [`Variables`](crate::core::Variables) headers.
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the event's name for display/logging.
    fn name(&self) -> &str;
}
