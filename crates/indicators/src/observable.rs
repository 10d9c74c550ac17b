//! Quantities an indicator can observe on a running system.

use crate::ConfigurationError;
use relia_core::{Probe, SystemView};
use relia_model::Model;
use relia_types::{AutomatonId, StateId, Value, VariableId};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Comparison between a variable and a test value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Operator {
    /// Evaluate `lhs <op> rhs`.
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
            Operator::Lt => lhs < rhs,
            Operator::Le => lhs <= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Ge => lhs >= rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

impl FromStr for Operator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            _ => Err(ConfigurationError::UnsupportedOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The quantity an indicator observes, designated by names.
#[derive(Clone, Deserialize)]
#[serde(tag = "observe", rename_all = "kebab-case")]
pub enum Observable {
    /// 1 while `component.automaton` is in `state`, 0 otherwise.
    State {
        component: String,
        automaton: String,
        state: String,
    },
    /// 1 while `component.variable <operator> value` holds, 0 otherwise.
    Variable {
        component: String,
        variable: String,
        #[serde(default)]
        operator: Operator,
        value: Value,
    },
    /// The numeric value of `component.variable`.
    Value { component: String, variable: String },
    /// A user function of the system.
    #[serde(skip)]
    Probe(Arc<dyn Probe>),
}

impl Observable {
    pub fn state(
        component: impl Into<String>,
        automaton: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Observable::State {
            component: component.into(),
            automaton: automaton.into(),
            state: state.into(),
        }
    }

    pub fn variable(
        component: impl Into<String>,
        variable: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Observable::Variable {
            component: component.into(),
            variable: variable.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn value(component: impl Into<String>, variable: impl Into<String>) -> Self {
        Observable::Value {
            component: component.into(),
            variable: variable.into(),
        }
    }

    pub fn probe(probe: impl Probe + 'static) -> Self {
        Observable::Probe(Arc::new(probe))
    }

    /// Resolve names against a model.
    pub(crate) fn bind(&self, model: &Model, indicator: &str) -> Result<Target, ConfigurationError> {
        let unknown = |kind: &'static str, target: String| ConfigurationError::UnknownTarget {
            indicator: indicator.to_string(),
            kind,
            target,
        };
        let lookup_variable = |component: &str,
                               variable: &str|
         -> Result<VariableId, ConfigurationError> {
            model
                .component_id(component)
                .ok_or_else(|| unknown("component", component.to_string()))?;
            model
                .variable_id(component, variable)
                .ok_or_else(|| unknown("variable", format!("{}.{}", component, variable)))
        };

        match self {
            Observable::State {
                component,
                automaton,
                state,
            } => {
                model
                    .component_id(component)
                    .ok_or_else(|| unknown("component", component.clone()))?;
                let aut = model
                    .automaton_id(component, automaton)
                    .ok_or_else(|| unknown("automaton", format!("{}.{}", component, automaton)))?;
                let st = model.state_id(aut, state).ok_or_else(|| {
                    unknown("state", format!("{}.{}.{}", component, automaton, state))
                })?;
                Ok(Target::State {
                    automaton: aut,
                    state: st,
                })
            }
            Observable::Variable {
                component,
                variable,
                operator,
                value,
            } => Ok(Target::Compare {
                variable: lookup_variable(component, variable)?,
                operator: *operator,
                value: value.as_f64(),
            }),
            Observable::Value {
                component,
                variable,
            } => Ok(Target::Value(lookup_variable(component, variable)?)),
            Observable::Probe(probe) => Ok(Target::Probe(Arc::clone(probe))),
        }
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observable({})", self)
    }
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observable::State {
                component,
                automaton,
                state,
            } => write!(f, "{}.{} == {}", component, automaton, state),
            Observable::Variable {
                component,
                variable,
                operator,
                value,
            } => write!(f, "{}.{} {} {}", component, variable, operator, value),
            Observable::Value {
                component,
                variable,
            } => write!(f, "{}.{}", component, variable),
            Observable::Probe(_) => write!(f, "<probe>"),
        }
    }
}

/// An observable resolved to model identifiers.
#[derive(Clone)]
pub(crate) enum Target {
    State {
        automaton: AutomatonId,
        state: StateId,
    },
    Compare {
        variable: VariableId,
        operator: Operator,
        value: f64,
    },
    Value(VariableId),
    Probe(Arc<dyn Probe>),
}

impl Target {
    pub(crate) fn observe(&self, view: &dyn SystemView) -> f64 {
        match self {
            Target::State { automaton, state } => indicator_bit(view.is_in(*automaton, *state)),
            Target::Compare {
                variable,
                operator,
                value,
            } => indicator_bit(operator.apply(view.variable(*variable).as_f64(), *value)),
            Target::Value(variable) => view.variable(*variable).as_f64(),
            Target::Probe(probe) => probe.observe(view),
        }
    }
}

fn indicator_bit(holds: bool) -> f64 {
    if holds {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relia_test_helpers::pump_system;

    #[test]
    fn test_operator_parsing() {
        assert_eq!(">=".parse::<Operator>(), Ok(Operator::Ge));
        assert!("=>".parse::<Operator>().is_err());
        assert!(Operator::Lt.apply(1.0, 2.0));
        assert!(!Operator::Ne.apply(2.0, 2.0));
    }

    #[test]
    fn test_bind_reports_unknown_targets() {
        let model = Model::from_spec(&pump_system()).unwrap();

        let err = Observable::state("Pump", "health", "melted")
            .bind(&model, "x")
            .err()
            .unwrap();
        assert_eq!(
            err,
            ConfigurationError::UnknownTarget {
                indicator: "x".into(),
                kind: "state",
                target: "Pump.health.melted".into(),
            }
        );

        let err = Observable::value("Boiler", "lambda").bind(&model, "y").err().unwrap();
        assert!(matches!(
            err,
            ConfigurationError::UnknownTarget {
                kind: "component",
                ..
            }
        ));

        assert!(Observable::variable("Pump", "spare", Operator::Eq, true)
            .bind(&model, "z")
            .is_ok());
    }

    #[test]
    fn test_deserialize_observables() {
        #[derive(Deserialize)]
        struct Wrapper {
            target: Observable,
        }

        let w: Wrapper = toml::from_str(
            r#"
            [target]
            observe = "state"
            component = "Pump"
            automaton = "health"
            state = "failed"
            "#,
        )
        .unwrap();
        assert_eq!(w.target.to_string(), "Pump.health == failed");

        let w: Wrapper = toml::from_str(
            r#"
            [target]
            observe = "variable"
            component = "Pump"
            variable = "lambda"
            operator = ">"
            value = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(w.target.to_string(), "Pump.lambda > 0.01");
    }
}
