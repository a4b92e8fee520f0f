//! Guard evaluation and action execution.

use crate::core::{Action, ActionContext, ActionError, Event, GuardContext, State, Variables};
use crate::table::{CompiledTransition, TransitionTable};

/// The action that stopped an action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FailedAction {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) error: ActionError,
}

/// Evaluate a transition's guard; no guard means the transition may fire.
pub(crate) fn evaluate_guard<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    transition: &CompiledTransition<S, E>,
    event: &E,
    headers: &Variables,
    variables: &Variables,
) -> bool {
    let Some(guard) = &transition.guard else {
        return true;
    };

    let ctx = GuardContext {
        event,
        source: table.id(transition.source),
        target: table.id(transition.target),
        headers,
        variables,
    };
    guard.check(&ctx)
}

/// Run actions in declared order, stopping at the first failure.
pub(crate) fn run_actions<S: State, E: Event>(
    actions: &[Action<S, E>],
    ctx: &mut ActionContext<'_, S, E>,
) -> Result<(), FailedAction> {
    for (index, action) in actions.iter().enumerate() {
        action.run(ctx).map_err(|error| FailedAction {
            index,
            name: action.name().to_string(),
            error,
        })?;
    }
    Ok(())
}
