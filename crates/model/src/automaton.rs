//! States, transitions and automata.

use indexmap::IndexMap;
use relia_core::{Guard, SystemView};
use relia_types::{AutomatonId, ComponentId, Distribution, StateId, TransitionId};
use std::fmt;
use std::sync::Arc;

/// A named state of an automaton.
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) automaton: AutomatonId,
    pub(crate) component: ComponentId,
    /// Transitions leaving this state, in declaration order.
    pub(crate) outgoing: Vec<TransitionId>,
}

impl State {
    /// State identifier.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// State name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning automaton.
    pub fn automaton(&self) -> AutomatonId {
        self.automaton
    }

    /// Owning component.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Transitions whose source is this state.
    pub fn outgoing(&self) -> &[TransitionId] {
        &self.outgoing
    }
}

/// A transition between two states of one automaton.
#[derive(Clone)]
pub struct Transition {
    pub(crate) id: TransitionId,
    pub(crate) name: String,
    pub(crate) automaton: AutomatonId,
    pub(crate) component: ComponentId,
    pub(crate) source: StateId,
    pub(crate) target: StateId,
    /// Law as declared, possibly referencing variables.
    pub(crate) declared_law: Distribution,
    /// Law with every variable reference replaced by its value.
    pub(crate) law: Distribution,
    pub(crate) interruptible: bool,
    pub(crate) guard: Option<Arc<dyn Guard>>,
}

impl Transition {
    /// Transition identifier.
    pub fn id(&self) -> TransitionId {
        self.id
    }

    /// Transition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning automaton.
    pub fn automaton(&self) -> AutomatonId {
        self.automaton
    }

    /// Owning component.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Source state.
    pub fn source(&self) -> StateId {
        self.source
    }

    /// Target state.
    pub fn target(&self) -> StateId {
        self.target
    }

    /// Occurrence law as declared in the specification.
    pub fn declared_law(&self) -> &Distribution {
        &self.declared_law
    }

    /// Resolved occurrence law, ready to sample.
    pub fn law(&self) -> &Distribution {
        &self.law
    }

    /// Whether the pending timer is discarded when the enabling condition ends.
    pub fn is_interruptible(&self) -> bool {
        self.interruptible
    }

    /// Whether a guard is attached.
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Evaluate the guard (an unguarded transition always holds).
    pub fn guard_holds(&self, view: &dyn SystemView) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard.holds(view))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("automaton", &self.automaton)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("law", &self.law)
            .field("interruptible", &self.interruptible)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// A stochastic automaton: ordered states plus transitions.
#[derive(Debug, Clone)]
pub struct Automaton {
    pub(crate) id: AutomatonId,
    pub(crate) name: String,
    pub(crate) component: ComponentId,
    /// States by name, in declaration order.
    pub(crate) states: IndexMap<String, StateId>,
    /// Transitions by name, in declaration order.
    pub(crate) transitions: IndexMap<String, TransitionId>,
    pub(crate) init_state: StateId,
    /// Whether the initial state was given explicitly.
    pub(crate) explicit_init: bool,
}

impl Automaton {
    /// Automaton identifier.
    pub fn id(&self) -> AutomatonId {
        self.id
    }

    /// Automaton name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning component.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Initial state.
    pub fn init_state(&self) -> StateId {
        self.init_state
    }

    /// States in declaration order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.values().copied()
    }

    /// Transitions in declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionId> + '_ {
        self.transitions.values().copied()
    }

    /// Look up a state by name.
    pub fn state(&self, name: &str) -> Option<StateId> {
        self.states.get(name).copied()
    }

    /// Look up a transition by name.
    pub fn transition(&self, name: &str) -> Option<TransitionId> {
        self.transitions.get(name).copied()
    }

    /// Whether `state` belongs to this automaton.
    pub fn contains(&self, state: StateId) -> bool {
        self.states.values().any(|&s| s == state)
    }
}
