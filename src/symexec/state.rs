use std::collections::BTreeMap;

use crate::ir::BlockId;
use crate::symexec::value::{Nullability, RefId, SymbolicValue};

/// Per-path snapshot: variable bindings, path constraints, block visit
/// counts.
///
/// States behave value-wise. Forking is a deep copy and no mutation of one
/// fork is ever visible in another. The constraint set is consistent by
/// construction: `constrain` refuses to produce a contradictory state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ProgramState {
    bindings: BTreeMap<String, SymbolicValue>,
    constraints: BTreeMap<RefId, Nullability>,
    visit_counts: BTreeMap<BlockId, u32>,
}

impl ProgramState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bind(&mut self, name: &str, value: SymbolicValue) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Unknown identifiers resolve to `Unknown`.
    pub(crate) fn lookup(&self, name: &str) -> SymbolicValue {
        self.bindings
            .get(name)
            .copied()
            .unwrap_or(SymbolicValue::Unknown)
    }

    pub(crate) fn constraint(&self, id: RefId) -> Option<Nullability> {
        self.constraints.get(&id).copied()
    }

    /// Returns the refined state, or `None` when the new fact contradicts
    /// the constraint set and the path is infeasible.
    pub(crate) fn constrain(&self, id: RefId, nullability: Nullability) -> Option<ProgramState> {
        match self.constraint(id) {
            Some(existing) if existing != nullability => None,
            Some(_) => Some(self.fork()),
            None => {
                let mut next = self.fork();
                next.constraints.insert(id, nullability);
                Some(next)
            }
        }
    }

    pub(crate) fn fork(&self) -> ProgramState {
        self.clone()
    }

    pub(crate) fn visit_count(&self, block: BlockId) -> u32 {
        self.visit_counts.get(&block).copied().unwrap_or(0)
    }

    /// Counts are per path and only ever grow.
    pub(crate) fn record_visit(&mut self, block: BlockId) {
        *self.visit_counts.entry(block).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symexec::value::RefIds;

    #[test]
    fn lookup_defaults_to_unknown() {
        let mut state = ProgramState::new();
        assert_eq!(state.lookup("a"), SymbolicValue::Unknown);

        state.bind("a", SymbolicValue::Null);
        assert_eq!(state.lookup("a"), SymbolicValue::Null);

        state.bind("a", SymbolicValue::NonNull);
        assert_eq!(state.lookup("a"), SymbolicValue::NonNull);
    }

    #[test]
    fn contradictory_constraint_yields_no_state() {
        let mut refs = RefIds::default();
        let id = refs.fresh();
        let state = ProgramState::new();

        let on_null = state.constrain(id, Nullability::Null).expect("feasible");
        assert!(on_null.constrain(id, Nullability::NonNull).is_none());
        assert!(on_null.constrain(id, Nullability::Null).is_some());
    }

    #[test]
    fn constraining_does_not_touch_the_original() {
        let mut refs = RefIds::default();
        let id = refs.fresh();
        let state = ProgramState::new();

        let refined = state.constrain(id, Nullability::NonNull).expect("feasible");

        assert_eq!(state.constraint(id), None);
        assert_eq!(refined.constraint(id), Some(Nullability::NonNull));
    }

    #[test]
    fn forks_are_independent() {
        let mut state = ProgramState::new();
        state.bind("a", SymbolicValue::Null);

        let mut fork = state.fork();
        fork.bind("a", SymbolicValue::NonNull);
        fork.bind("b", SymbolicValue::Null);

        assert_eq!(state.lookup("a"), SymbolicValue::Null);
        assert_eq!(state.lookup("b"), SymbolicValue::Unknown);
        assert_eq!(fork.lookup("a"), SymbolicValue::NonNull);
    }

    #[test]
    fn visit_counts_are_per_state() {
        let mut state = ProgramState::new();
        assert_eq!(state.visit_count(0), 0);

        state.record_visit(0);
        state.record_visit(0);
        let fork = state.fork();
        state.record_visit(0);

        assert_eq!(state.visit_count(0), 3);
        assert_eq!(fork.visit_count(0), 2);
        assert_eq!(state.visit_count(1), 0);
    }
}
