use crate::symexec::state::ProgramState;

/// Identity of an opaque reference value tracked through path constraints.
///
/// Two symbolic references are the same value iff their ids match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct RefId(u32);

/// Allocates fresh reference identities for one executor instance.
#[derive(Debug, Default)]
pub(crate) struct RefIds {
    next: u32,
}

impl RefIds {
    pub(crate) fn fresh(&mut self) -> RefId {
        let id = RefId(self.next);
        self.next += 1;
        id
    }
}

/// Constraint polarity attached to a symbolic reference on one path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) enum Nullability {
    Null,
    NonNull,
}

/// Abstract value of a local or an expression on one path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SymbolicValue {
    Unknown,
    Null,
    NonNull,
    True,
    False,
    Ref(RefId),
}

impl SymbolicValue {
    pub(crate) fn from_bool(value: bool) -> Self {
        if value {
            SymbolicValue::True
        } else {
            SymbolicValue::False
        }
    }

    /// Provably null under the given path constraints.
    pub(crate) fn is_definitely_null(self, state: &ProgramState) -> bool {
        match self {
            SymbolicValue::Null => true,
            SymbolicValue::Ref(id) => state.constraint(id) == Some(Nullability::Null),
            _ => false,
        }
    }

    /// Provably non-null under the given path constraints. Literals and
    /// boolean constants are never null.
    pub(crate) fn is_definitely_non_null(self, state: &ProgramState) -> bool {
        match self {
            SymbolicValue::NonNull | SymbolicValue::True | SymbolicValue::False => true,
            SymbolicValue::Ref(id) => state.constraint(id) == Some(Nullability::NonNull),
            _ => false,
        }
    }

    pub(crate) fn may_be_null(self, state: &ProgramState) -> bool {
        !self.is_definitely_non_null(state)
    }
}

/// Least upper bound in the flat lattice: equal values keep their shape,
/// anything else generalizes to `Unknown`.
pub(crate) fn join(left: SymbolicValue, right: SymbolicValue) -> SymbolicValue {
    if left == right {
        left
    } else {
        SymbolicValue::Unknown
    }
}
