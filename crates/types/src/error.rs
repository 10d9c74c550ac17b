//! Error types raised while building a model or validating its parameters.
//!
//! Both kinds are detected before any replication starts.

use thiserror::Error;

/// Malformed model specification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// An automaton declares no states.
    #[error("Automaton '{automaton}' has no states")]
    EmptyAutomaton { automaton: String },

    /// The declared initial state is not one of the automaton's states.
    #[error("Init state '{state}' not in automaton '{automaton}' states list {states:?}")]
    UnknownInitState {
        automaton: String,
        state: String,
        states: Vec<String>,
    },

    /// A transition endpoint is not one of the automaton's states.
    #[error("Transition '{transition}' {role} state '{state}' not in automaton '{automaton}' states list {states:?}")]
    UnknownEndpoint {
        automaton: String,
        transition: String,
        role: &'static str,
        state: String,
        states: Vec<String>,
    },

    /// Two entities with the same name in the same scope.
    #[error("Duplicate {kind} '{name}' in '{scope}'")]
    Duplicate {
        kind: &'static str,
        name: String,
        scope: String,
    },

    /// The occurrence law kind is not supported.
    #[error("Distribution '{0}' is not supported")]
    UnsupportedDistribution(String),

    /// A distribution parameter names a variable that does not exist.
    #[error("Transition '{transition}' references unknown variable '{reference}'")]
    UnknownVariable {
        transition: String,
        reference: String,
    },

    /// A variable's initial value does not match its declared type.
    #[error("Variable '{variable}' of component '{component}' is declared {declared} but initialised with {value}")]
    VariableType {
        component: String,
        variable: String,
        declared: String,
        value: String,
    },

    /// A distribution parameter is invalid.
    #[error("Transition '{transition}': {source}")]
    Parameter {
        transition: String,
        #[source]
        source: ParameterError,
    },

    /// A guard was attached to a transition that does not exist.
    #[error("No transition '{transition}' in automaton '{automaton}' of component '{component}'")]
    UnknownTransition {
        component: String,
        automaton: String,
        transition: String,
    },

    /// More entities of one kind than an identifier can address.
    #[error("Too many {kind} entities in model")]
    TooManyEntities { kind: &'static str },
}

/// Invalid numeric parameter of a law, schedule or study.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    /// A distribution parameter is outside its domain.
    #[error("Invalid parameter for {law}: {name} = {value}")]
    InvalidParameter {
        law: &'static str,
        name: &'static str,
        value: f64,
    },

    /// A distribution was sampled before its variable references were resolved.
    #[error("Parameter '{0}' references a variable and must be resolved before sampling")]
    Unresolved(String),

    /// The sampling schedule contains no instants.
    #[error("Instant schedule is empty")]
    EmptySchedule,

    /// The sampling instants are not in ascending order.
    #[error("Instant schedule is not sorted: {next} follows {previous}")]
    UnsortedSchedule { previous: f64, next: f64 },

    /// The sampling schedule contains a negative or non-finite instant.
    #[error("Invalid instant {0}")]
    InvalidInstant(f64),

    /// At least one replication is required.
    #[error("Number of runs must be at least 1, got {0}")]
    NbRuns(usize),
}
