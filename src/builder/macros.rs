//! Macros for declaring state and event identifier enums.

/// Generate a fieldless enum implementing [`State`](crate::core::State).
///
/// The generated enum derives `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`,
/// `Debug`, `Serialize` and `Deserialize`, and implements `Display` using
/// the variant name.
///
/// # Example
///
/// ```
/// use statechart::state_enum;
/// use statechart::core::State;
///
/// state_enum! {
///     pub enum PlayerState {
///         Idle,
///         Playing,
///         Paused,
///     }
/// }
///
/// assert_eq!(PlayerState::Paused.name(), "Paused");
/// assert_eq!(PlayerState::Idle.to_string(), "Idle");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::State::name(self))
            }
        }
    };
}

/// Generate a fieldless enum implementing [`Event`](crate::core::Event).
///
/// The generated enum derives `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash` and
/// `Debug`, and implements `Display` and `FromStr` using the variant name
/// (case-insensitive), so hosts can parse events typed by a user.
///
/// # Example
///
/// ```
/// use statechart::event_enum;
/// use statechart::core::Event;
///
/// event_enum! {
///     pub enum Button {
///         Play,
///         Eject,
///     }
/// }
///
/// let parsed: Button = "play".parse().unwrap();
/// assert_eq!(parsed, Button::Play);
/// assert_eq!(Button::Eject.name(), "Eject");
/// assert!("rewind".parse::<Button>().is_err());
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Event for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::Event::name(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::builder::UnknownEvent;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case(stringify!($variant)) {
                        return Ok(Self::$variant);
                    }
                )*
                Err($crate::builder::UnknownEvent::new(s))
            }
        }
    };
}
