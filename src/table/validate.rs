//! Validation of table definitions.
//!
//! Each check returns a stillwater `Validation` so that every violation in a
//! definition is collected instead of stopping at the first one.

use super::state::StateDef;
use super::transition::{Transition, TransitionKind};
use super::StateIdx;
use crate::builder::{ConfigViolation, ConfigurationError};
use crate::core::{Event, State};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub(crate) type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn pass() -> Check {
    Validation::success(())
}

fn violation(v: ConfigViolation) -> Check {
    Validation::fail(v)
}

/// Collapse all checks into a single result, keeping every violation.
pub(crate) fn finish(checks: Vec<Check>) -> Result<(), ConfigurationError> {
    match Validation::all_vec(checks).map(|_| ()) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(ConfigurationError::new(
            errors.iter().cloned().collect(),
        )),
    }
}

/// Flag states whose parent chain loops back onto themselves.
pub(crate) fn check_cycles<S: State, E: Event>(
    defs: &[StateDef<S, E>],
    parents: &[Option<StateIdx>],
) -> Vec<Check> {
    (0..parents.len())
        .map(|start| {
            let mut current = parents[start];
            for _ in 0..parents.len() {
                match current {
                    Some(idx) if idx == start => {
                        return violation(ConfigViolation::HierarchyCycle {
                            state: defs[start].id.name().to_string(),
                        })
                    }
                    Some(idx) => current = parents[idx],
                    None => break,
                }
            }
            pass()
        })
        .collect()
}

/// Every region must name exactly one initial member.
pub(crate) fn check_region_initials<S: State, E: Event>(
    defs: &[StateDef<S, E>],
    groups: &[((Option<StateIdx>, Option<String>), Vec<StateIdx>)],
) -> Vec<Check> {
    groups
        .iter()
        .map(|((parent, region), members)| {
            let initials: Vec<String> = members
                .iter()
                .filter(|&&m| defs[m].initial)
                .map(|&m| defs[m].id.name().to_string())
                .collect();
            let parent = parent.map(|p| defs[p].id.name().to_string());
            match initials.len() {
                1 => pass(),
                0 => violation(ConfigViolation::MissingRegionInitial {
                    parent,
                    region: region.clone(),
                }),
                _ => violation(ConfigViolation::MultipleRegionInitials {
                    parent,
                    region: region.clone(),
                    states: initials,
                }),
            }
        })
        .collect()
}

/// Final states are leaves without outgoing transitions.
pub(crate) fn check_final_states<S: State, E: Event>(
    defs: &[StateDef<S, E>],
    parents: &[Option<StateIdx>],
    sources: &[Option<StateIdx>],
) -> Vec<Check> {
    let with_children: HashSet<StateIdx> = parents.iter().flatten().copied().collect();
    let with_transitions: HashSet<StateIdx> = sources.iter().flatten().copied().collect();

    defs.iter()
        .enumerate()
        .filter(|(_, def)| def.is_final)
        .flat_map(|(idx, def)| {
            let name = def.id.name().to_string();
            let children = if with_children.contains(&idx) {
                violation(ConfigViolation::FinalStateHasChildren {
                    state: name.clone(),
                })
            } else {
                pass()
            };
            let outgoing = if with_transitions.contains(&idx) {
                violation(ConfigViolation::FinalStateHasTransitions { state: name })
            } else {
                pass()
            };
            [children, outgoing]
        })
        .collect()
}

/// Resolve a transition's endpoints against the state index.
pub(crate) fn check_endpoints<S: State, E: Event>(
    transition: &Transition<S, E>,
    index: &HashMap<S, StateIdx>,
) -> Vec<Check> {
    let event = transition.event.name().to_string();
    let mut checks = Vec::new();

    checks.push(if index.contains_key(&transition.source) {
        pass()
    } else {
        violation(ConfigViolation::UnknownSourceState {
            state: transition.source.name().to_string(),
            event: event.clone(),
        })
    });

    checks.push(if index.contains_key(&transition.target) {
        pass()
    } else {
        violation(ConfigViolation::UnknownTargetState {
            state: transition.target.name().to_string(),
            event: event.clone(),
        })
    });

    checks.push(
        if transition.kind == TransitionKind::Internal && transition.source != transition.target {
            violation(ConfigViolation::InternalTargetMismatch {
                source_state: transition.source.name().to_string(),
                target: transition.target.name().to_string(),
                event,
            })
        } else {
            pass()
        },
    );

    checks
}

/// Duplicate (source, event) pairs with an unguarded member can never be
/// told apart, since an unguarded transition is always eligible. Groups where
/// every member is guarded are only caught at dispatch time.
pub(crate) fn check_ambiguity<S: State, E: Event>(transitions: &[Transition<S, E>]) -> Vec<Check> {
    let mut groups: Vec<((&S, &E), usize, usize)> = Vec::new();
    for t in transitions {
        let unguarded = usize::from(!t.is_guarded());
        match groups
            .iter_mut()
            .find(|((s, e), _, _)| *s == &t.source && *e == &t.event)
        {
            Some((_, count, open)) => {
                *count += 1;
                *open += unguarded;
            }
            None => groups.push(((&t.source, &t.event), 1, unguarded)),
        }
    }

    groups
        .into_iter()
        .map(|((source, event), count, unguarded)| {
            if count > 1 && unguarded > 0 {
                violation(ConfigViolation::AmbiguousTransitions {
                    source_state: source.name().to_string(),
                    event: event.name().to_string(),
                    count,
                })
            } else {
                pass()
            }
        })
        .collect()
}
