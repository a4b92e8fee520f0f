//! Configuration errors reported when a transition table is built.

use thiserror::Error;

/// A single problem found while validating a table definition.
///
/// States and events are referred to by name so the error does not carry
/// the identifier types around.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("No states declared")]
    NoStates,

    #[error("State '{state}' is declared more than once")]
    DuplicateState { state: String },

    #[error("State '{state}' names unknown parent '{parent}'")]
    UnknownParent { state: String, parent: String },

    #[error("State '{state}' is part of a parent cycle")]
    HierarchyCycle { state: String },

    #[error("Initial state '{state}' is not declared")]
    UnknownInitialState { state: String },

    #[error("Region {} has no initial state", describe_region(.parent, .region))]
    MissingRegionInitial {
        parent: Option<String>,
        region: Option<String>,
    },

    #[error("Region {} has several initial states: {}", describe_region(.parent, .region), .states.join(", "))]
    MultipleRegionInitials {
        parent: Option<String>,
        region: Option<String>,
        states: Vec<String>,
    },

    #[error("Final state '{state}' cannot have substates")]
    FinalStateHasChildren { state: String },

    #[error("Final state '{state}' cannot have outgoing transitions")]
    FinalStateHasTransitions { state: String },

    #[error("Transition source state not specified. Call .from(state)")]
    MissingFromState,

    #[error("Transition target state not specified. Call .to(state) or .internal()")]
    MissingToState,

    #[error("Transition event not specified. Call .on(event)")]
    MissingEvent,

    #[error("Transition on '{event}' has unknown source state '{state}'")]
    UnknownSourceState { state: String, event: String },

    #[error("Transition on '{event}' has unknown target state '{state}'")]
    UnknownTargetState { state: String, event: String },

    #[error("Internal transition on '{event}' from '{source_state}' targets '{target}'")]
    InternalTargetMismatch {
        source_state: String,
        target: String,
        event: String,
    },

    #[error("State '{source_state}' has {count} unguarded transitions on '{event}'")]
    AmbiguousTransitions {
        source_state: String,
        event: String,
        count: usize,
    },
}

fn describe_region(parent: &Option<String>, region: &Option<String>) -> String {
    let parent = parent.as_deref().unwrap_or("<root>");
    match region {
        Some(region) => format!("'{}' of '{}'", region, parent),
        None => format!("of '{}'", parent),
    }
}

/// Every violation found in a table definition.
///
/// Validation does not stop at the first problem; all of them are reported
/// together so a definition can be fixed in one pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid state machine configuration: {}", join_violations(.violations))]
pub struct ConfigurationError {
    violations: Vec<ConfigViolation>,
}

impl ConfigurationError {
    pub fn new(violations: Vec<ConfigViolation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[ConfigViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<ConfigViolation> {
        self.violations
    }
}

impl From<ConfigViolation> for ConfigurationError {
    fn from(violation: ConfigViolation) -> Self {
        Self::new(vec![violation])
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
