//! The model arena.

use crate::{Automaton, Component, State, Transition, Variable};
use indexmap::IndexMap;
use relia_core::Guard;
use relia_types::{
    AutomatonId, AutomatonSpec, ComponentId, ComponentSpec, ModelError, ResolveError, StateId,
    SystemSpec, TransitionId, TransitionSpec, VariableId, VariableSpec,
};
use std::sync::Arc;
use tracing::{debug, info};

/// An immutable system model.
///
/// Built once from a [`SystemSpec`], then shared read-only (usually behind an
/// `Arc`) by every replication. All cross references are arena indices;
/// nothing here changes during a simulation.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    components: Vec<Component>,
    automata: Vec<Automaton>,
    states: Vec<State>,
    transitions: Vec<Transition>,
    variables: Vec<Variable>,
    component_index: IndexMap<String, ComponentId>,
}

impl Model {
    /// Build and validate a model.
    ///
    /// Every error in the specification is reported here, before any
    /// simulation work: empty automata, unknown initial states or transition
    /// endpoints, duplicate names, badly typed variables, unknown variable
    /// references and out-of-domain law parameters.
    pub fn from_spec(spec: &SystemSpec) -> Result<Self, ModelError> {
        let mut model = Model {
            name: spec.name.clone(),
            components: Vec::with_capacity(spec.components.len()),
            automata: Vec::new(),
            states: Vec::new(),
            transitions: Vec::new(),
            variables: Vec::new(),
            component_index: IndexMap::new(),
        };

        // Variables first: laws may reference variables of any component.
        for component_spec in &spec.components {
            model.add_component(component_spec)?;
        }
        for (idx, component_spec) in spec.components.iter().enumerate() {
            for automaton_spec in &component_spec.automata {
                let component = model.components[idx].id;
                model.add_automaton(component, automaton_spec)?;
            }
        }

        info!(
            system = %model.name,
            components = model.components.len(),
            automata = model.automata.len(),
            transitions = model.transitions.len(),
            "Built model"
        );

        Ok(model)
    }

    fn add_component(&mut self, spec: &ComponentSpec) -> Result<(), ModelError> {
        let id = arena_id(ComponentId::try_from_index, self.components.len(), "component")?;
        if self.component_index.contains_key(&spec.name) {
            return Err(ModelError::Duplicate {
                kind: "component",
                name: spec.name.clone(),
                scope: self.name.clone(),
            });
        }

        let mut variables = IndexMap::new();
        for var_spec in &spec.variables {
            let var_id = self.add_variable(id, &spec.name, var_spec)?;
            if variables.insert(var_spec.name.clone(), var_id).is_some() {
                return Err(ModelError::Duplicate {
                    kind: "variable",
                    name: var_spec.name.clone(),
                    scope: spec.name.clone(),
                });
            }
        }

        self.component_index.insert(spec.name.clone(), id);
        self.components.push(Component {
            id,
            name: spec.name.clone(),
            automata: IndexMap::new(),
            variables,
        });
        Ok(())
    }

    fn add_variable(
        &mut self,
        component: ComponentId,
        component_name: &str,
        spec: &VariableSpec,
    ) -> Result<VariableId, ModelError> {
        let init = spec
            .init
            .coerce(spec.value_type)
            .ok_or_else(|| ModelError::VariableType {
                component: component_name.to_string(),
                variable: spec.name.clone(),
                declared: spec.value_type.to_string(),
                value: spec.init.to_string(),
            })?;

        let id = arena_id(VariableId::try_from_index, self.variables.len(), "variable")?;
        self.variables.push(Variable {
            id,
            name: spec.name.clone(),
            component,
            value_type: spec.value_type,
            init,
            declared_init: spec.init,
        });
        Ok(id)
    }

    fn add_automaton(
        &mut self,
        component: ComponentId,
        spec: &AutomatonSpec,
    ) -> Result<(), ModelError> {
        let component_name = self.components[component.index()].name.clone();
        if self.components[component.index()]
            .automata
            .contains_key(&spec.name)
        {
            return Err(ModelError::Duplicate {
                kind: "automaton",
                name: spec.name.clone(),
                scope: component_name,
            });
        }
        if spec.states.is_empty() {
            return Err(ModelError::EmptyAutomaton {
                automaton: spec.name.clone(),
            });
        }

        let id = arena_id(AutomatonId::try_from_index, self.automata.len(), "automaton")?;

        let mut states = IndexMap::new();
        for name in &spec.states {
            let state_id = arena_id(StateId::try_from_index, self.states.len() + states.len(), "state")?;
            if states.insert(name.clone(), state_id).is_some() {
                return Err(ModelError::Duplicate {
                    kind: "state",
                    name: name.clone(),
                    scope: spec.name.clone(),
                });
            }
        }

        let init_state = match &spec.init_state {
            None => states[0],
            Some(name) => {
                *states
                    .get(name)
                    .ok_or_else(|| ModelError::UnknownInitState {
                        automaton: spec.name.clone(),
                        state: name.clone(),
                        states: spec.states.clone(),
                    })?
            }
        };

        // Validate every transition before touching the arena.
        let mut resolved = Vec::with_capacity(spec.transitions.len());
        let mut transition_names = IndexMap::new();
        for (offset, trans_spec) in spec.transitions.iter().enumerate() {
            let endpoint = |role: &'static str, state: &str| {
                states
                    .get(state)
                    .copied()
                    .ok_or_else(|| ModelError::UnknownEndpoint {
                        automaton: spec.name.clone(),
                        transition: trans_spec.name.clone(),
                        role,
                        state: state.to_string(),
                        states: spec.states.clone(),
                    })
            };
            let source = endpoint("source", &trans_spec.source)?;
            let target = endpoint("target", &trans_spec.target)?;
            let law = self.resolve_law(trans_spec)?;

            let trans_id = arena_id(
                TransitionId::try_from_index,
                self.transitions.len() + offset,
                "transition",
            )?;
            if transition_names
                .insert(trans_spec.name.clone(), trans_id)
                .is_some()
            {
                return Err(ModelError::Duplicate {
                    kind: "transition",
                    name: trans_spec.name.clone(),
                    scope: spec.name.clone(),
                });
            }
            resolved.push((trans_id, source, target, law));
        }

        for (name, &state_id) in &states {
            self.states.push(State {
                id: state_id,
                name: name.clone(),
                automaton: id,
                component,
                outgoing: Vec::new(),
            });
        }

        for (trans_spec, (trans_id, source, target, law)) in spec.transitions.iter().zip(resolved)
        {
            self.states[source.index()].outgoing.push(trans_id);
            self.transitions.push(Transition {
                id: trans_id,
                name: trans_spec.name.clone(),
                automaton: id,
                component,
                source,
                target,
                declared_law: trans_spec.occurrence_law.clone(),
                law,
                interruptible: trans_spec.interruptible,
                guard: None,
            });
        }

        debug!(
            component = %component_name,
            automaton = %spec.name,
            states = states.len(),
            transitions = transition_names.len(),
            "Added automaton"
        );

        self.automata.push(Automaton {
            id,
            name: spec.name.clone(),
            component,
            states,
            transitions: transition_names,
            init_state,
            explicit_init: spec.init_state.is_some(),
        });
        self.components[component.index()]
            .automata
            .insert(spec.name.clone(), id);
        Ok(())
    }

    fn resolve_law(&self, spec: &TransitionSpec) -> Result<relia_types::Distribution, ModelError> {
        spec.occurrence_law
            .resolve(|component, variable| {
                let var = self.variable_id(component, variable)?;
                Some(self.variables[var.index()].init.as_f64())
            })
            .map_err(|e| match e {
                ResolveError::UnknownVariable(reference) => ModelError::UnknownVariable {
                    transition: spec.name.clone(),
                    reference,
                },
                ResolveError::Parameter(source) => ModelError::Parameter {
                    transition: spec.name.clone(),
                    source,
                },
            })
    }

    /// Attach a guard to a transition.
    ///
    /// Guards are opaque to the engine; see [`Guard`] for the enabling rules.
    pub fn set_guard(&mut self, transition: TransitionId, guard: impl Guard + 'static) {
        self.transitions[transition.index()].guard = Some(Arc::new(guard));
    }

    /// Attach a guard to a transition designated by names.
    pub fn set_guard_by_name(
        &mut self,
        component: &str,
        automaton: &str,
        transition: &str,
        guard: impl Guard + 'static,
    ) -> Result<TransitionId, ModelError> {
        let id = self
            .automaton_id(component, automaton)
            .and_then(|aut| self.automata[aut.index()].transition(transition))
            .ok_or_else(|| ModelError::UnknownTransition {
                component: component.to_string(),
                automaton: automaton.to_string(),
                transition: transition.to_string(),
            })?;
        self.set_guard(id, guard);
        Ok(id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// System name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All components in declaration order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// All automata, grouped by component in declaration order.
    pub fn automata(&self) -> &[Automaton] {
        &self.automata
    }

    /// All transitions.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// All variables.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Get a component.
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.index()]
    }

    /// Get an automaton.
    pub fn automaton(&self, id: AutomatonId) -> &Automaton {
        &self.automata[id.index()]
    }

    /// Get a state.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Get a transition.
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    /// Get a variable.
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Look up a component by name.
    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.component_index.get(name).copied()
    }

    /// Look up an automaton by component and automaton name.
    pub fn automaton_id(&self, component: &str, automaton: &str) -> Option<AutomatonId> {
        let comp = self.component_id(component)?;
        self.components[comp.index()].automaton(automaton)
    }

    /// Look up a state of an automaton by name.
    pub fn state_id(&self, automaton: AutomatonId, state: &str) -> Option<StateId> {
        self.automata[automaton.index()].state(state)
    }

    /// Look up a variable by component and variable name.
    pub fn variable_id(&self, component: &str, variable: &str) -> Option<VariableId> {
        let comp = self.component_id(component)?;
        self.components[comp.index()].variable(variable)
    }

    /// `component.automaton` path of an automaton, for reporting.
    pub fn automaton_path(&self, id: AutomatonId) -> String {
        let automaton = self.automaton(id);
        format!(
            "{}.{}",
            self.component(automaton.component).name,
            automaton.name
        )
    }

    /// Rebuild the specification this model was built from.
    ///
    /// Guards are not part of a specification and are not reflected.
    pub fn to_spec(&self) -> SystemSpec {
        let components = self
            .components
            .iter()
            .map(|component| ComponentSpec {
                name: component.name.clone(),
                variables: component
                    .variables()
                    .map(|id| {
                        let var = self.variable(id);
                        VariableSpec {
                            name: var.name.clone(),
                            value_type: var.value_type,
                            init: var.declared_init,
                        }
                    })
                    .collect(),
                automata: component
                    .automata()
                    .map(|id| self.automaton_spec(id))
                    .collect(),
            })
            .collect();

        SystemSpec {
            name: self.name.clone(),
            components,
        }
    }

    fn automaton_spec(&self, id: AutomatonId) -> AutomatonSpec {
        let automaton = self.automaton(id);
        AutomatonSpec {
            name: automaton.name.clone(),
            states: automaton.states.keys().cloned().collect(),
            init_state: automaton
                .explicit_init
                .then(|| self.state(automaton.init_state).name.clone()),
            transitions: automaton
                .transitions()
                .map(|tid| {
                    let trans = self.transition(tid);
                    TransitionSpec {
                        name: trans.name.clone(),
                        source: self.state(trans.source).name.clone(),
                        target: self.state(trans.target).name.clone(),
                        occurrence_law: trans.declared_law.clone(),
                        interruptible: trans.interruptible,
                    }
                })
                .collect(),
        }
    }
}

fn arena_id<T>(
    make: fn(usize) -> Option<T>,
    index: usize,
    kind: &'static str,
) -> Result<T, ModelError> {
    make(index).ok_or(ModelError::TooManyEntities { kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relia_test_helpers::{pump_system, race_system};
    use relia_types::{Distribution, Param, ParameterError, Value, ValueType};
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_build_pump_system() {
        let model = Model::from_spec(&pump_system()).unwrap();
        assert_eq!(model.name(), "plant");
        assert_eq!(model.components().len(), 2);

        let health = model.automaton_id("Pump", "health").unwrap();
        let ok = model.state_id(health, "ok").unwrap();
        let failed = model.state_id(health, "failed").unwrap();
        assert_eq!(model.automaton(health).init_state(), ok);

        let fail = model.automaton(health).transition("fail").unwrap();
        let fail = model.transition(fail);
        assert_eq!(fail.source(), ok);
        assert_eq!(fail.target(), failed);
        assert_eq!(fail.law(), &Distribution::exponential(0.001));
        assert_eq!(
            fail.declared_law(),
            &Distribution::exponential(Param::variable("Pump", "lambda"))
        );
        assert_eq!(model.state(ok).outgoing(), &[fail.id()]);
    }

    #[test]
    fn test_round_trip() {
        for spec in [pump_system(), race_system()] {
            let model = Model::from_spec(&spec).unwrap();
            assert_eq!(model.to_spec(), spec);
        }
    }

    #[test]
    fn test_round_trip_keeps_declared_init() {
        let spec = SystemSpec::new("s").with_component(ComponentSpec::new("C").with_variable(
            VariableSpec {
                name: "ratio".to_string(),
                value_type: ValueType::Float,
                init: Value::Int(1),
            },
        ));
        let model = Model::from_spec(&spec).unwrap();
        let ratio = model.variable_id("C", "ratio").unwrap();
        assert_eq!(model.variable(ratio).init(), Value::Float(1.0));
        assert_eq!(model.to_spec(), spec);
    }

    #[test]
    fn test_default_init_state_is_first() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(AutomatonSpec::new("a", ["X", "Y"])),
        );
        let model = Model::from_spec(&spec).unwrap();
        let aut = model.automaton_id("C", "a").unwrap();
        assert_eq!(model.state(model.automaton(aut).init_state()).name(), "X");
    }

    #[test]
    fn test_unknown_init_state() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C")
                .with_automaton(AutomatonSpec::new("a", ["X", "Y"]).with_init_state("Z")),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::UnknownInitState { state, .. }) if state == "Z"
        ));
    }

    #[test]
    fn test_unknown_endpoint() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(AutomatonSpec::new("a", ["X"]).with_transition(
                TransitionSpec::new("t", "X", "Y", Distribution::delay(1.0)),
            )),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::UnknownEndpoint { role: "target", state, .. }) if state == "Y"
        ));
    }

    #[test]
    fn test_empty_automaton() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(AutomatonSpec::new("a", Vec::<String>::new())),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::EmptyAutomaton { .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let spec = SystemSpec::new("s")
            .with_component(ComponentSpec::new("C"))
            .with_component(ComponentSpec::new("C"));
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::Duplicate { kind: "component", .. })
        ));

        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(AutomatonSpec::new("a", ["X", "X"])),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::Duplicate { kind: "state", .. })
        ));
    }

    #[test]
    fn test_invalid_rate_is_rejected_at_build() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(
                AutomatonSpec::new("a", ["X", "Y"]).with_transition(TransitionSpec::new(
                    "t",
                    "X",
                    "Y",
                    Distribution::exponential(0.0),
                )),
            ),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::Parameter {
                source: ParameterError::InvalidParameter { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_variable_reference() {
        let spec = SystemSpec::new("s").with_component(
            ComponentSpec::new("C").with_automaton(
                AutomatonSpec::new("a", ["X", "Y"]).with_transition(TransitionSpec::new(
                    "t",
                    "X",
                    "Y",
                    Distribution::exponential(Param::variable("C", "nope")),
                )),
            ),
        );
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::UnknownVariable { reference, .. }) if reference == "C.nope"
        ));
    }

    #[test]
    fn test_variable_type_mismatch() {
        let spec = SystemSpec::new("s").with_component(ComponentSpec::new("C").with_variable(
            VariableSpec {
                name: "flag".to_string(),
                value_type: ValueType::Bool,
                init: Value::Int(1),
            },
        ));
        assert!(matches!(
            Model::from_spec(&spec),
            Err(ModelError::VariableType { .. })
        ));
    }

    #[test]
    fn test_set_guard_by_name() {
        let mut model = Model::from_spec(&pump_system()).unwrap();
        let id = model
            .set_guard_by_name("Pump", "health", "repair", |_: &dyn relia_core::SystemView| {
                false
            })
            .unwrap();
        assert!(model.transition(id).is_guarded());

        assert!(matches!(
            model.set_guard_by_name("Pump", "health", "nope", |_: &dyn relia_core::SystemView| {
                true
            }),
            Err(ModelError::UnknownTransition { .. })
        ));
    }
}
