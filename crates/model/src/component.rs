//! Components and their auxiliary variables.

use indexmap::IndexMap;
use relia_types::{AutomatonId, ComponentId, Value, ValueType, VariableId};

/// A typed auxiliary variable.
///
/// The engine never writes variables. They parametrise occurrence laws and
/// can be observed by indicators.
#[derive(Debug, Clone)]
pub struct Variable {
    pub(crate) id: VariableId,
    pub(crate) name: String,
    pub(crate) component: ComponentId,
    pub(crate) value_type: ValueType,
    pub(crate) init: Value,
    /// Initial value as written, before coercion to `value_type`.
    pub(crate) declared_init: Value,
}

impl Variable {
    /// Variable identifier.
    pub fn id(&self) -> VariableId {
        self.id
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning component.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Declared type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Initial value.
    pub fn init(&self) -> Value {
        self.init
    }
}

/// A logical subsystem grouping automata and variables.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) name: String,
    pub(crate) automata: IndexMap<String, AutomatonId>,
    pub(crate) variables: IndexMap<String, VariableId>,
}

impl Component {
    /// Component identifier.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Automata in declaration order.
    pub fn automata(&self) -> impl Iterator<Item = AutomatonId> + '_ {
        self.automata.values().copied()
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.variables.values().copied()
    }

    /// Look up an automaton by name.
    pub fn automaton(&self, name: &str) -> Option<AutomatonId> {
        self.automata.get(name).copied()
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<VariableId> {
        self.variables.get(name).copied()
    }
}
