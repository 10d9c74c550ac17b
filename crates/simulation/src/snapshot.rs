//! Read-only snapshots of a running system, for inspection and reporting.

use relia_types::{SimTime, TransitionId};
use std::fmt;

/// A pending transition firing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTransition {
    pub transition_id: TransitionId,
    pub component: String,
    pub automaton: String,
    pub transition: String,
    pub source: String,
    pub target: String,
    /// Occurrence law as declared, e.g. `exp(Pump.lambda)`.
    pub law: String,
    pub scheduled_time: SimTime,
    pub interruptible: bool,
}

impl fmt::Display for ActiveTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {} -> {} [{}] at {}{}",
            self.component,
            self.transition,
            self.source,
            self.target,
            self.law,
            self.scheduled_time,
            if self.interruptible {
                ""
            } else {
                " (non-interruptible)"
            }
        )
    }
}

/// Kind of a component status entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// An automaton; values are state names.
    Automaton,
    /// A variable; values are rendered values.
    Variable,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Automaton => write!(f, "ST"),
            StatusKind::Variable => write!(f, "VAR"),
        }
    }
}

/// Initial and current value of one automaton or variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStatus {
    pub component: String,
    pub name: String,
    pub kind: StatusKind,
    pub init: String,
    pub current: String,
}
