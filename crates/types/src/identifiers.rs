//! Domain-specific identifier types.
//!
//! Every model entity lives in an arena owned by the model and is addressed
//! by one of these indices. They are only meaningful for the model that
//! issued them.

use std::fmt;

/// Component identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Automaton identifier (unique across all components).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AutomatonId(pub u32);

impl fmt::Display for AutomatonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Automaton({})", self.0)
    }
}

/// State identifier (unique across all automata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({})", self.0)
    }
}

/// Transition identifier (unique across all automata).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u32);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transition({})", self.0)
    }
}

/// Variable identifier (unique across all components).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(pub u32);

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({})", self.0)
    }
}

/// Index of a replication within a Monte Carlo study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicationId(pub u64);

impl ReplicationId {
    /// Get the next replication index.
    pub fn next(self) -> Self {
        ReplicationId(self.0 + 1)
    }
}

impl fmt::Display for ReplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Replication({})", self.0)
    }
}

/// Convert a dense arena position into an identifier.
macro_rules! impl_index {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// Build an identifier from an arena position, or `None` if
                /// `index` does not fit in a `u32`.
                pub fn try_from_index(index: usize) -> Option<Self> {
                    u32::try_from(index).ok().map($ty)
                }

                /// Arena position of this identifier.
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

impl_index!(ComponentId, AutomatonId, StateId, TransitionId, VariableId);
