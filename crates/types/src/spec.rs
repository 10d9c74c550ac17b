//! Static model specifications.
//!
//! These are the already-authored descriptions the engine consumes: plain
//! data, deserialisable from a study file and buildable in code. Referential
//! integrity is checked when a model is built from them.

use crate::{Distribution, Value, ValueType};
use serde::Deserialize;

/// A whole system: a set of named components.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SystemSpec {
    /// System name.
    pub name: String,

    /// Components, in declaration order.
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl SystemSpec {
    /// Create an empty system specification.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Add a component.
    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }
}

/// A component groups automata and auxiliary variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentSpec {
    /// Component name, unique within the system.
    pub name: String,

    /// Auxiliary variables.
    #[serde(default)]
    pub variables: Vec<VariableSpec>,

    /// Automata.
    #[serde(default)]
    pub automata: Vec<AutomatonSpec>,
}

impl ComponentSpec {
    /// Create an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            automata: Vec::new(),
        }
    }

    /// Add a variable.
    pub fn with_variable(mut self, variable: VariableSpec) -> Self {
        self.variables.push(variable);
        self
    }

    /// Add an automaton.
    pub fn with_automaton(mut self, automaton: AutomatonSpec) -> Self {
        self.automata.push(automaton);
        self
    }
}

/// A typed component variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableSpec {
    /// Variable name, unique within its component.
    pub name: String,

    /// Declared type.
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Initial (and, for the engine, constant) value.
    pub init: Value,
}

impl VariableSpec {
    /// Create a variable whose type is the type of its initial value.
    pub fn new(name: impl Into<String>, init: impl Into<Value>) -> Self {
        let init = init.into();
        Self {
            name: name.into(),
            value_type: init.value_type(),
            init,
        }
    }
}

/// A stochastic automaton.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutomatonSpec {
    /// Automaton name, unique within its component.
    pub name: String,

    /// State names, in order. The first one is the default initial state.
    pub states: Vec<String>,

    /// Explicit initial state.
    #[serde(default)]
    pub init_state: Option<String>,

    /// Transitions between states.
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

impl AutomatonSpec {
    /// Create an automaton over the given states.
    pub fn new<I, S>(name: impl Into<String>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
            init_state: None,
            transitions: Vec::new(),
        }
    }

    /// Set the initial state.
    pub fn with_init_state(mut self, state: impl Into<String>) -> Self {
        self.init_state = Some(state.into());
        self
    }

    /// Add a transition.
    pub fn with_transition(mut self, transition: TransitionSpec) -> Self {
        self.transitions.push(transition);
        self
    }
}

/// A transition between two states of the same automaton.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransitionSpec {
    /// Transition name, unique within its automaton.
    pub name: String,

    /// Source state name.
    pub source: String,

    /// Target state name.
    pub target: String,

    /// Occurrence law.
    #[serde(rename = "occ_law")]
    pub occurrence_law: Distribution,

    /// Whether leaving the source state discards the pending timer.
    #[serde(default = "default_interruptible", alias = "is_interruptible")]
    pub interruptible: bool,
}

fn default_interruptible() -> bool {
    true
}

impl TransitionSpec {
    /// Create an interruptible transition.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        occurrence_law: Distribution,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            occurrence_law,
            interruptible: true,
        }
    }

    /// Set whether the transition is interruptible.
    pub fn with_interruptible(mut self, interruptible: bool) -> Self {
        self.interruptible = interruptible;
        self
    }
}
