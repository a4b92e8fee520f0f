//! The live set of active states.
//!
//! Invariant: every active state's ancestors are active, and every region
//! of every active composite (and every top-level region) has exactly one
//! active member. `enter` and `exit` preserve it; nothing outside the
//! dispatcher mutates a configuration.

use crate::core::{Event, State};
use crate::table::{StateIdx, TransitionTable};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StateConfiguration {
    active: BTreeSet<StateIdx>,
}

impl StateConfiguration {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_indices(active: impl IntoIterator<Item = StateIdx>) -> Self {
        Self {
            active: active.into_iter().collect(),
        }
    }

    pub(crate) fn is_active(&self, idx: StateIdx) -> bool {
        self.active.contains(&idx)
    }

    /// Active states in declaration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = StateIdx> + '_ {
        self.active.iter().copied()
    }

    pub(crate) fn active_states<S: State, E: Event>(&self, table: &TransitionTable<S, E>) -> Vec<S> {
        self.iter().map(|idx| table.id(idx).clone()).collect()
    }

    /// Active states none of whose children are active.
    pub(crate) fn leaves<S: State, E: Event>(&self, table: &TransitionTable<S, E>) -> Vec<StateIdx> {
        self.iter()
            .filter(|&idx| {
                table
                    .regions_of(Some(idx))
                    .iter()
                    .all(|region| !region.members.iter().any(|&m| self.is_active(m)))
            })
            .collect()
    }

    /// Enter `target`: its inactive ancestors first, then the target, then
    /// the initial member of every region left without an active member.
    ///
    /// Returns the newly entered states, shallowest first.
    pub(crate) fn enter<S: State, E: Event>(
        &mut self,
        table: &TransitionTable<S, E>,
        target: StateIdx,
    ) -> Vec<StateIdx> {
        let mut entered = Vec::new();
        let mut path: Vec<StateIdx> = table.ancestors(target).collect();
        path.reverse();
        path.push(target);

        for idx in path {
            if self.active.insert(idx) {
                entered.push(idx);
            }
        }
        self.complete(table, None, &mut entered);
        entered
    }

    /// Enter the initial configuration of an empty machine.
    pub(crate) fn enter_initial<S: State, E: Event>(
        &mut self,
        table: &TransitionTable<S, E>,
    ) -> Vec<StateIdx> {
        let mut entered = Vec::new();
        self.complete(table, None, &mut entered);
        entered
    }

    /// Fill every region below `scope` that has no active member with its
    /// initial state, recursively.
    fn complete<S: State, E: Event>(
        &mut self,
        table: &TransitionTable<S, E>,
        scope: Option<StateIdx>,
        entered: &mut Vec<StateIdx>,
    ) {
        for region in table.regions_of(scope) {
            let next = match region.members.iter().copied().find(|&m| self.is_active(m)) {
                Some(active) => active,
                None => {
                    self.active.insert(region.initial);
                    entered.push(region.initial);
                    region.initial
                }
            };
            self.complete(table, Some(next), entered);
        }
    }

    /// Exit `idx` and every active descendant.
    ///
    /// Returns the exited states, deepest first.
    pub(crate) fn exit<S: State, E: Event>(
        &mut self,
        table: &TransitionTable<S, E>,
        idx: StateIdx,
    ) -> Vec<StateIdx> {
        let mut exited = self.subtree(table, idx);
        exited.sort_by(|a, b| table.depth(*b).cmp(&table.depth(*a)).then(b.cmp(a)));
        for a in &exited {
            self.active.remove(a);
        }
        exited
    }

    /// `idx`, if active, and its active descendants.
    pub(crate) fn subtree<S: State, E: Event>(
        &self,
        table: &TransitionTable<S, E>,
        idx: StateIdx,
    ) -> Vec<StateIdx> {
        self.iter()
            .filter(|&a| a == idx || table.is_proper_ancestor(idx, a))
            .collect()
    }

    /// Check the configuration invariant against `table`.
    pub(crate) fn is_consistent<S: State, E: Event>(&self, table: &TransitionTable<S, E>) -> bool {
        if self.active.iter().any(|&idx| idx >= table.len()) {
            return false;
        }

        let closed = self
            .iter()
            .all(|idx| table.parent(idx).map_or(true, |p| self.is_active(p)));

        let mut scopes = std::iter::once(None).chain(self.iter().map(Some));
        let one_per_region = scopes.all(|scope| {
            table.regions_of(scope).iter().all(|region| {
                region.members.iter().filter(|&&m| self.is_active(m)).count() == 1
            })
        });

        closed && one_per_region
    }
}
