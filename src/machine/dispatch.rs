//! Transition selection and the state moves a selected transition makes.
//!
//! Everything here is read-only over the configuration except
//! [`run_state_hooks`], which runs entry or exit actions after the dispatcher
//! has committed to a step.

use super::configuration::StateConfiguration;
use super::evaluator::{evaluate_guard, run_actions};
use super::result::{DispatchError, HookPhase};
use crate::core::{ActionContext, ActionScope, Event, PendingEvent, State, Variables};
use crate::table::{CompiledTransition, StateIdx, TransitionIdx, TransitionKind, TransitionTable};
use std::collections::{BTreeSet, VecDeque};

/// Pick the transitions `event` fires from the current configuration.
///
/// Every active leaf is walked up to the top level; the deepest state with
/// an eligible transition wins for that leaf. Transitions that would tear
/// down states another selected transition relies on are dropped, keeping
/// the one with the deeper source. The result keeps leaf order.
pub(crate) fn select<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    config: &StateConfiguration,
    event: &E,
    headers: &Variables,
    variables: &Variables,
) -> Result<Vec<TransitionIdx>, DispatchError> {
    let mut candidates: Vec<TransitionIdx> = Vec::new();

    for leaf in config.leaves(table) {
        for state in std::iter::once(leaf).chain(table.ancestors(leaf)) {
            let eligible: Vec<TransitionIdx> = table
                .transitions_from(state, event)
                .iter()
                .copied()
                .filter(|&t| evaluate_guard(table, table.transition(t), event, headers, variables))
                .collect();

            match eligible.as_slice() {
                [] => continue,
                [only] => {
                    if !candidates.contains(only) {
                        candidates.push(*only);
                    }
                    break;
                }
                _ => {
                    return Err(DispatchError::Ambiguous {
                        state: table.id(state).name().to_string(),
                        event: event.name().to_string(),
                        candidates: eligible.len(),
                    })
                }
            }
        }
    }

    Ok(resolve_conflicts(table, config, candidates))
}

fn resolve_conflicts<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    config: &StateConfiguration,
    candidates: Vec<TransitionIdx>,
) -> Vec<TransitionIdx> {
    if candidates.len() < 2 {
        return candidates;
    }

    let mut by_depth = candidates.clone();
    by_depth.sort_by_key(|&t| std::cmp::Reverse(table.depth(table.transition(t).source)));

    let mut kept: Vec<(TransitionIdx, BTreeSet<StateIdx>, BTreeSet<StateIdx>)> = Vec::new();
    for t in by_depth {
        let exits = exit_set(table, config, table.transition(t));
        let mut footprint = exits.clone();
        footprint.insert(table.transition(t).source);

        let conflicts = kept.iter().any(|(_, other_exits, other_footprint)| {
            !exits.is_disjoint(other_footprint) || !other_exits.is_disjoint(&footprint)
        });
        if conflicts {
            tracing::debug!(
                source = table.id(table.transition(t).source).name(),
                target = table.id(table.transition(t).target).name(),
                "dropping transition that conflicts with a deeper one"
            );
            continue;
        }
        kept.push((t, exits, footprint));
    }

    candidates
        .into_iter()
        .filter(|t| kept.iter().any(|(k, _, _)| k == t))
        .collect()
}

/// The state whose descendants a transition may exit and re-enter.
/// `None` is the top level.
fn domain<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    transition: &CompiledTransition<S, E>,
) -> Option<StateIdx> {
    let (source, target) = (transition.source, transition.target);
    if transition.kind == TransitionKind::Local {
        if table.is_proper_ancestor(source, target) {
            return Some(source);
        }
        if table.is_proper_ancestor(target, source) {
            return Some(target);
        }
    }
    table
        .ancestors(source)
        .find(|&a| table.is_proper_ancestor(a, target))
}

/// Active states that head the subtrees a transition exits.
///
/// One per region of the domain touched by the source or target path, so a
/// transition across orthogonal regions exits both of them.
pub(crate) fn exit_roots<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    config: &StateConfiguration,
    transition: &CompiledTransition<S, E>,
) -> Vec<StateIdx> {
    if transition.kind == TransitionKind::Internal {
        return Vec::new();
    }

    let scope = domain(table, transition);
    let regions = table.regions_of(scope);
    let mut roots = Vec::new();
    for end in [transition.source, transition.target] {
        if Some(end) == scope {
            continue;
        }
        let child = table.child_toward(scope, end);
        let active = regions
            .get(table.region_of(child))
            .and_then(|region| region.members.iter().copied().find(|&m| config.is_active(m)));
        if let Some(root) = active {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
    }
    roots
}

fn exit_set<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    config: &StateConfiguration,
    transition: &CompiledTransition<S, E>,
) -> BTreeSet<StateIdx> {
    exit_roots(table, config, transition)
        .into_iter()
        .flat_map(|root| config.subtree(table, root))
        .collect()
}

/// Run the entry or exit actions of `states`, in order.
///
/// A failing list is reported and the remaining states still run theirs.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_state_hooks<S: State, E: Event>(
    table: &TransitionTable<S, E>,
    states: &[StateIdx],
    phase: HookPhase,
    event: Option<&E>,
    headers: &Variables,
    variables: &mut Variables,
    queued: &mut VecDeque<PendingEvent<E>>,
    diagnostics: &mut Vec<DispatchError>,
) {
    for &idx in states {
        let node = table.node(idx);
        let (actions, scope) = match phase {
            HookPhase::Entry => (&node.entry, ActionScope::Entry(&node.id)),
            HookPhase::Exit => (&node.exit, ActionScope::Exit(&node.id)),
        };
        tracing::trace!(state = node.id.name(), %phase, "state hook");
        if actions.is_empty() {
            continue;
        }

        let mut ctx = ActionContext {
            event,
            scope,
            headers,
            variables: &mut *variables,
            queued: &mut *queued,
        };
        if let Err(failed) = run_actions(actions, &mut ctx) {
            tracing::warn!(
                state = node.id.name(),
                %phase,
                action = %failed.name,
                error = %failed.error,
                "state action failed"
            );
            diagnostics.push(DispatchError::StateActionFailed {
                state: node.id.name().to_string(),
                phase,
                action: failed.name,
                message: failed.error.message().to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;
    use crate::table::{StateDef, Transition};

    crate::state_enum! {
        enum Cd { Idle, Deck, Playing, Paused, Tray, Closed, Open }
    }

    crate::event_enum! {
        enum Button { Play, Pause, Eject, Stop, Toggle }
    }

    fn go(source: Cd, target: Cd, event: Button, kind: TransitionKind) -> Transition<Cd, Button> {
        Transition {
            source,
            target,
            event,
            guard: None,
            actions: Vec::new(),
            kind,
        }
    }

    fn table(transitions: Vec<Transition<Cd, Button>>) -> TransitionTable<Cd, Button> {
        TransitionTable::build(
            vec![
                StateDef::new(Cd::Idle),
                StateDef::new(Cd::Deck),
                StateDef::new(Cd::Playing).parent(Cd::Deck).region("audio").initial(),
                StateDef::new(Cd::Paused).parent(Cd::Deck).region("audio"),
                StateDef::new(Cd::Tray).parent(Cd::Deck).region("tray").initial(),
                StateDef::new(Cd::Closed).parent(Cd::Tray).initial(),
                StateDef::new(Cd::Open).parent(Cd::Tray),
            ],
            transitions,
            Cd::Idle,
        )
        .unwrap()
    }

    fn in_deck(table: &TransitionTable<Cd, Button>) -> StateConfiguration {
        let mut config = StateConfiguration::new();
        config.enter(table, table.idx_of(&Cd::Deck).unwrap());
        config
    }

    fn names(table: &TransitionTable<Cd, Button>, idx: &[StateIdx]) -> Vec<Cd> {
        idx.iter().map(|&i| *table.id(i)).collect()
    }

    #[test]
    fn deepest_matching_state_wins() {
        let table = table(vec![
            go(Cd::Deck, Cd::Idle, Button::Stop, TransitionKind::External),
            go(Cd::Playing, Cd::Paused, Button::Stop, TransitionKind::External),
        ]);
        let config = in_deck(&table);
        let vars = Variables::new();

        let selected = select(&table, &config, &Button::Stop, &vars, &vars).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(table.transition(selected[0]).source, table.idx_of(&Cd::Playing).unwrap());
    }

    #[test]
    fn failing_guard_falls_through_to_ancestor() {
        let mut guarded = go(Cd::Playing, Cd::Paused, Button::Stop, TransitionKind::External);
        guarded.guard = Some(Guard::new(|_| false));
        let table = table(vec![
            go(Cd::Deck, Cd::Idle, Button::Stop, TransitionKind::External),
            guarded,
        ]);
        let config = in_deck(&table);
        let vars = Variables::new();

        let selected = select(&table, &config, &Button::Stop, &vars, &vars).unwrap();

        assert_eq!(selected.len(), 1);
        assert_eq!(table.transition(selected[0]).source, table.idx_of(&Cd::Deck).unwrap());
    }

    #[test]
    fn shared_ancestor_transition_is_taken_once() {
        let table = table(vec![go(Cd::Deck, Cd::Idle, Button::Stop, TransitionKind::External)]);
        let config = in_deck(&table);
        let vars = Variables::new();

        let selected = select(&table, &config, &Button::Stop, &vars, &vars).unwrap();

        assert_eq!(selected, vec![0]);
    }

    #[test]
    fn orthogonal_regions_fire_together() {
        let table = table(vec![
            go(Cd::Playing, Cd::Paused, Button::Toggle, TransitionKind::External),
            go(Cd::Closed, Cd::Open, Button::Toggle, TransitionKind::External),
        ]);
        let config = in_deck(&table);
        let vars = Variables::new();

        let selected = select(&table, &config, &Button::Toggle, &vars, &vars).unwrap();

        assert_eq!(selected, vec![0, 1]);
    }

    #[test]
    fn conflicting_transitions_keep_the_deeper_source() {
        let table = table(vec![
            go(Cd::Playing, Cd::Idle, Button::Eject, TransitionKind::External),
            go(Cd::Closed, Cd::Open, Button::Eject, TransitionKind::External),
        ]);
        let config = in_deck(&table);
        let vars = Variables::new();

        let selected = select(&table, &config, &Button::Eject, &vars, &vars).unwrap();

        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn guarded_overlap_is_ambiguous_at_runtime() {
        let mut first = go(Cd::Idle, Cd::Deck, Button::Play, TransitionKind::External);
        first.guard = Some(Guard::new(|_| true));
        let mut second = go(Cd::Idle, Cd::Playing, Button::Play, TransitionKind::External);
        second.guard = Some(Guard::new(|_| true));
        let table = table(vec![first, second]);
        let mut config = StateConfiguration::new();
        config.enter_initial(&table);
        let vars = Variables::new();

        let err = select(&table, &config, &Button::Play, &vars, &vars).unwrap_err();

        assert_eq!(
            err,
            DispatchError::Ambiguous {
                state: "Idle".to_string(),
                event: "Play".to_string(),
                candidates: 2,
            }
        );
    }

    #[test]
    fn exit_roots_follow_transition_kind() {
        let table = table(vec![
            go(Cd::Playing, Cd::Paused, Button::Pause, TransitionKind::External),
            go(Cd::Deck, Cd::Deck, Button::Stop, TransitionKind::Internal),
            go(Cd::Deck, Cd::Paused, Button::Pause, TransitionKind::Local),
            go(Cd::Deck, Cd::Paused, Button::Play, TransitionKind::External),
            go(Cd::Open, Cd::Deck, Button::Eject, TransitionKind::Local),
        ]);
        let config = in_deck(&table);

        let roots = |t: usize| names(&table, &exit_roots(&table, &config, table.transition(t)));

        assert_eq!(roots(0), vec![Cd::Playing]);
        assert!(roots(1).is_empty());
        assert_eq!(roots(2), vec![Cd::Playing]);
        assert_eq!(roots(3), vec![Cd::Deck]);
        assert_eq!(roots(4), vec![Cd::Tray]);
    }

    #[test]
    fn cross_region_transition_exits_both_regions() {
        let table = table(vec![go(Cd::Playing, Cd::Open, Button::Eject, TransitionKind::External)]);
        let config = in_deck(&table);

        let roots = exit_roots(&table, &config, table.transition(0));

        assert_eq!(names(&table, &roots), vec![Cd::Playing, Cd::Tray]);
    }

    #[test]
    fn failing_state_hook_is_reported_and_others_still_run() {
        let table = TransitionTable::<Cd, Button>::build(
            vec![
                StateDef::new(Cd::Idle)
                    .initial()
                    .try_entry_fn("spin up", |_| Err(crate::core::ActionError::new("no disc"))),
                StateDef::new(Cd::Deck).entry_fn("light", |ctx| {
                    ctx.variables.insert("light", true);
                }),
            ],
            Vec::new(),
            Cd::Idle,
        )
        .unwrap();
        let states = vec![table.idx_of(&Cd::Idle).unwrap(), table.idx_of(&Cd::Deck).unwrap()];
        let mut variables = Variables::new();
        let mut queued = VecDeque::new();
        let mut diagnostics = Vec::new();

        run_state_hooks(
            &table,
            &states,
            HookPhase::Entry,
            None,
            &Variables::new(),
            &mut variables,
            &mut queued,
            &mut diagnostics,
        );

        assert_eq!(
            diagnostics,
            vec![DispatchError::StateActionFailed {
                state: "Idle".to_string(),
                phase: HookPhase::Entry,
                action: "spin up".to_string(),
                message: "no disc".to_string(),
            }]
        );
        assert_eq!(variables.get_as::<bool>("light"), Some(true));
    }
}
