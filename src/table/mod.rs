//! Immutable transition table.
//!
//! The table is an arena of state nodes linked by index (parent, region
//! members) plus a lookup from `(state, event)` to the transitions defined
//! on that state. It is validated and compiled once and never mutated, so a
//! single `Arc<TransitionTable>` can back any number of machines, on any
//! number of threads.

mod state;
mod transition;
pub(crate) mod validate;

pub use state::StateDef;
pub use transition::{Transition, TransitionKind};

use crate::builder::{ConfigViolation, ConfigurationError};
use crate::core::{Action, Event, Guard, State};
use std::collections::{HashMap, HashSet};
use stillwater::validation::Validation;
use validate::Check;

pub(crate) type StateIdx = usize;
pub(crate) type TransitionIdx = usize;

/// An orthogonal region: the children of one parent sharing a region name.
#[derive(Debug, Clone)]
pub(crate) struct Region {
    pub(crate) initial: StateIdx,
    pub(crate) members: Vec<StateIdx>,
}

#[derive(Debug)]
pub(crate) struct StateNode<S: State, E: Event> {
    pub(crate) id: S,
    pub(crate) parent: Option<StateIdx>,
    pub(crate) depth: usize,
    pub(crate) is_final: bool,
    pub(crate) regions: Vec<Region>,
    pub(crate) entry: Vec<Action<S, E>>,
    pub(crate) exit: Vec<Action<S, E>>,
    pub(crate) deferred: HashSet<E>,
}

#[derive(Debug)]
pub(crate) struct CompiledTransition<S: State, E: Event> {
    pub(crate) source: StateIdx,
    pub(crate) target: StateIdx,
    pub(crate) guard: Option<Guard<S, E>>,
    pub(crate) actions: Vec<Action<S, E>>,
    pub(crate) kind: TransitionKind,
}

/// Validated, immutable description of a state machine.
#[derive(Debug)]
pub struct TransitionTable<S: State, E: Event> {
    states: Vec<StateNode<S, E>>,
    index: HashMap<S, StateIdx>,
    transitions: Vec<CompiledTransition<S, E>>,
    lookup: HashMap<(StateIdx, E), Vec<TransitionIdx>>,
    root_regions: Vec<Region>,
}

impl<S: State, E: Event> TransitionTable<S, E> {
    /// Validate and compile a table.
    ///
    /// `initial` is marked as the initial member of its region (normally
    /// the top level). All violations are reported together.
    pub fn build(
        states: Vec<StateDef<S, E>>,
        transitions: Vec<Transition<S, E>>,
        initial: S,
    ) -> Result<Self, ConfigurationError> {
        Self::compile(states, transitions, Some(initial))
    }

    pub(crate) fn compile(
        states: Vec<StateDef<S, E>>,
        transitions: Vec<Transition<S, E>>,
        initial: Option<S>,
    ) -> Result<Self, ConfigurationError> {
        if states.is_empty() {
            return Err(ConfigViolation::NoStates.into());
        }

        let mut checks: Vec<Check> = Vec::new();

        // Arena of unique states, in declaration order.
        let mut defs: Vec<StateDef<S, E>> = Vec::with_capacity(states.len());
        let mut index: HashMap<S, StateIdx> = HashMap::new();
        for def in states {
            if index.contains_key(&def.id) {
                checks.push(Validation::fail(ConfigViolation::DuplicateState {
                    state: def.id.name().to_string(),
                }));
                continue;
            }
            index.insert(def.id.clone(), defs.len());
            defs.push(def);
        }

        if let Some(initial) = initial {
            match index.get(&initial) {
                Some(&idx) => defs[idx].initial = true,
                None => checks.push(Validation::fail(ConfigViolation::UnknownInitialState {
                    state: initial.name().to_string(),
                })),
            }
        }

        let parents: Vec<Option<StateIdx>> = defs
            .iter()
            .map(|def| {
                let parent = def.parent.as_ref()?;
                let resolved = index.get(parent).copied();
                if resolved.is_none() {
                    checks.push(Validation::fail(ConfigViolation::UnknownParent {
                        state: def.id.name().to_string(),
                        parent: parent.name().to_string(),
                    }));
                }
                resolved
            })
            .collect();
        checks.extend(validate::check_cycles(&defs, &parents));

        let groups = group_regions(&defs, &parents);
        checks.extend(validate::check_region_initials(&defs, &groups));

        let mut sources: Vec<Option<StateIdx>> = Vec::with_capacity(transitions.len());
        for t in &transitions {
            checks.extend(validate::check_endpoints(t, &index));
            sources.push(index.get(&t.source).copied());
        }
        checks.extend(validate::check_final_states(&defs, &parents, &sources));
        checks.extend(validate::check_ambiguity(&transitions));

        validate::finish(checks)?;

        // Validation passed: every reference resolves and the hierarchy is a forest.
        let mut root_regions = Vec::new();
        let mut child_regions: Vec<Vec<Region>> = vec![Vec::new(); defs.len()];
        for ((parent, _), members) in groups {
            let initial = members
                .iter()
                .copied()
                .find(|&m| defs[m].initial)
                .unwrap_or(members[0]);
            let region = Region { initial, members };
            match parent {
                Some(p) => child_regions[p].push(region),
                None => root_regions.push(region),
            }
        }

        let depths: Vec<usize> = (0..defs.len())
            .map(|idx| {
                let mut depth = 0;
                let mut current = parents[idx];
                while let Some(p) = current {
                    depth += 1;
                    current = parents[p];
                }
                depth
            })
            .collect();

        let states: Vec<StateNode<S, E>> = defs
            .into_iter()
            .zip(child_regions)
            .enumerate()
            .map(|(idx, (def, regions))| StateNode {
                id: def.id,
                parent: parents[idx],
                depth: depths[idx],
                is_final: def.is_final,
                regions,
                entry: def.entry,
                exit: def.exit,
                deferred: def.deferred.into_iter().collect(),
            })
            .collect();

        let mut compiled = Vec::with_capacity(transitions.len());
        let mut lookup: HashMap<(StateIdx, E), Vec<TransitionIdx>> = HashMap::new();
        for t in transitions {
            let source = index[&t.source];
            let target = index[&t.target];
            lookup
                .entry((source, t.event))
                .or_default()
                .push(compiled.len());
            compiled.push(CompiledTransition {
                source,
                target,
                guard: t.guard,
                actions: t.actions,
                kind: t.kind,
            });
        }

        tracing::debug!(
            states = states.len(),
            transitions = compiled.len(),
            regions = root_regions.len(),
            "compiled transition table"
        );

        Ok(Self {
            states,
            index,
            transitions: compiled,
            lookup,
            root_regions,
        })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn contains(&self, state: &S) -> bool {
        self.index.contains_key(state)
    }

    /// State identifiers in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.states.iter().map(|node| &node.id)
    }

    pub fn parent_of(&self, state: &S) -> Option<&S> {
        let idx = *self.index.get(state)?;
        self.states[idx].parent.map(|p| &self.states[p].id)
    }

    pub fn is_composite(&self, state: &S) -> bool {
        self.index
            .get(state)
            .is_some_and(|&idx| !self.states[idx].regions.is_empty())
    }

    pub fn is_final(&self, state: &S) -> bool {
        self.index
            .get(state)
            .is_some_and(|&idx| self.states[idx].is_final)
    }

    /// Number of transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub(crate) fn idx_of(&self, state: &S) -> Option<StateIdx> {
        self.index.get(state).copied()
    }

    pub(crate) fn node(&self, idx: StateIdx) -> &StateNode<S, E> {
        &self.states[idx]
    }

    pub(crate) fn id(&self, idx: StateIdx) -> &S {
        &self.states[idx].id
    }

    pub(crate) fn parent(&self, idx: StateIdx) -> Option<StateIdx> {
        self.states[idx].parent
    }

    pub(crate) fn depth(&self, idx: StateIdx) -> usize {
        self.states[idx].depth
    }

    /// Regions directly below `scope`; `None` is the top level.
    pub(crate) fn regions_of(&self, scope: Option<StateIdx>) -> &[Region] {
        match scope {
            Some(idx) => &self.states[idx].regions,
            None => &self.root_regions,
        }
    }

    pub(crate) fn root_regions(&self) -> &[Region] {
        &self.root_regions
    }

    /// Position of the region holding `idx` among its parent's regions.
    pub(crate) fn region_of(&self, idx: StateIdx) -> usize {
        self.regions_of(self.parent(idx))
            .iter()
            .position(|region| region.members.contains(&idx))
            .unwrap_or(0)
    }

    /// True when `ancestor` lies strictly above `idx`.
    pub(crate) fn is_proper_ancestor(&self, ancestor: StateIdx, idx: StateIdx) -> bool {
        let mut current = self.states[idx].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.states[p].parent;
        }
        false
    }

    /// Ancestors of `idx` from its parent up to the top level.
    pub(crate) fn ancestors(&self, idx: StateIdx) -> impl Iterator<Item = StateIdx> + '_ {
        std::iter::successors(self.states[idx].parent, move |&p| self.states[p].parent)
    }

    /// The ancestor-or-self of `idx` whose parent is `scope`.
    pub(crate) fn child_toward(&self, scope: Option<StateIdx>, idx: StateIdx) -> StateIdx {
        let mut current = idx;
        while self.states[current].parent != scope {
            match self.states[current].parent {
                Some(p) => current = p,
                None => break,
            }
        }
        current
    }

    pub(crate) fn transitions_from(&self, state: StateIdx, event: &E) -> &[TransitionIdx] {
        self.lookup
            .get(&(state, event.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn transition(&self, idx: TransitionIdx) -> &CompiledTransition<S, E> {
        &self.transitions[idx]
    }
}

/// Group children by (parent, region name), preserving declaration order.
fn group_regions<S: State, E: Event>(
    defs: &[StateDef<S, E>],
    parents: &[Option<StateIdx>],
) -> Vec<((Option<StateIdx>, Option<String>), Vec<StateIdx>)> {
    let mut groups: Vec<((Option<StateIdx>, Option<String>), Vec<StateIdx>)> = Vec::new();
    for (idx, def) in defs.iter().enumerate() {
        let key = (parents[idx], def.region.clone());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(idx),
            None => groups.push((key, vec![idx])),
        }
    }
    groups
}
