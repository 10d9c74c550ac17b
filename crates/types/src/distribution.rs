//! Occurrence laws.
//!
//! A transition's occurrence law turns "this transition became enabled" into
//! "this transition fires after this delay". The set of laws is closed: a new
//! law is a new variant plus a new arm in [`Distribution::sample`].

use crate::{ModelError, ParameterError, SimTime};
use rand::distributions::Open01;
use rand::Rng;
use serde::Deserialize;
use std::fmt;

/// A law parameter: either a literal or a reference to a component variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawParam")]
pub enum Param {
    /// Literal value.
    Value(f64),

    /// Value of `component.variable` at model construction time.
    Variable { component: String, variable: String },
}

impl Param {
    /// Create a reference to a component variable.
    pub fn variable(component: impl Into<String>, variable: impl Into<String>) -> Self {
        Param::Variable {
            component: component.into(),
            variable: variable.into(),
        }
    }

    /// The literal value, if this parameter is resolved.
    pub fn value(&self) -> Option<f64> {
        match self {
            Param::Value(v) => Some(*v),
            Param::Variable { .. } => None,
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Value(value)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Value(v) => write!(f, "{}", v),
            Param::Variable {
                component,
                variable,
            } => write!(f, "{}.{}", component, variable),
        }
    }
}

/// Wire form of a parameter: a number, or `"Component.variable"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParam {
    Number(f64),
    Reference(String),
}

impl TryFrom<RawParam> for Param {
    type Error = String;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        match raw {
            RawParam::Number(v) => Ok(Param::Value(v)),
            RawParam::Reference(s) => match s.split_once('.') {
                Some((component, variable)) if !component.is_empty() && !variable.is_empty() => {
                    Ok(Param::variable(component, variable))
                }
                _ => Err(format!(
                    "variable reference '{}' must have the form 'component.variable'",
                    s
                )),
            },
        }
    }
}

/// Occurrence law of a transition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "dist")]
pub enum Distribution {
    /// Fires exactly `time` after being enabled.
    #[serde(rename = "delay")]
    Delay { time: Param },

    /// Fires after an exponentially distributed delay with the given rate.
    #[serde(rename = "exp", alias = "exponential")]
    Exponential { rate: Param },
}

impl Distribution {
    /// Deterministic delay.
    pub fn delay(time: impl Into<Param>) -> Self {
        Distribution::Delay { time: time.into() }
    }

    /// Exponential law.
    pub fn exponential(rate: impl Into<Param>) -> Self {
        Distribution::Exponential { rate: rate.into() }
    }

    /// Build a law from its short kind name (`delay`, `exp`) and single parameter.
    pub fn from_kind(kind: &str, param: Param) -> Result<Self, ModelError> {
        match kind {
            "delay" => Ok(Distribution::Delay { time: param }),
            "exp" | "exponential" => Ok(Distribution::Exponential { rate: param }),
            other => Err(ModelError::UnsupportedDistribution(other.to_string())),
        }
    }

    /// Short kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Distribution::Delay { .. } => "delay",
            Distribution::Exponential { .. } => "exp",
        }
    }

    /// The law's single parameter.
    pub fn param(&self) -> &Param {
        match self {
            Distribution::Delay { time } => time,
            Distribution::Exponential { rate } => rate,
        }
    }

    /// Replace variable references with their values.
    ///
    /// `lookup` maps `(component, variable)` to the variable's numeric value.
    /// On success the returned law is fully resolved and validated.
    pub fn resolve<F>(&self, lookup: F) -> Result<Distribution, ResolveError>
    where
        F: Fn(&str, &str) -> Option<f64>,
    {
        let value = match self.param() {
            Param::Value(v) => *v,
            Param::Variable {
                component,
                variable,
            } => lookup(component, variable)
                .ok_or_else(|| ResolveError::UnknownVariable(self.param().to_string()))?,
        };

        let resolved = match self {
            Distribution::Delay { .. } => Distribution::Delay {
                time: Param::Value(value),
            },
            Distribution::Exponential { .. } => Distribution::Exponential {
                rate: Param::Value(value),
            },
        };
        resolved.validate().map_err(ResolveError::Parameter)?;
        Ok(resolved)
    }

    /// Check that the law's parameter is within its domain.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let value = self
            .param()
            .value()
            .ok_or_else(|| ParameterError::Unresolved(self.param().to_string()))?;

        match self {
            Distribution::Delay { .. } => {
                if value.is_nan() || value < 0.0 {
                    return Err(ParameterError::InvalidParameter {
                        law: "delay",
                        name: "time",
                        value,
                    });
                }
            }
            Distribution::Exponential { .. } => {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ParameterError::InvalidParameter {
                        law: "exp",
                        name: "rate",
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Sample a firing delay.
    ///
    /// `Delay` ignores `rng`. `Exponential` consumes exactly one draw.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SimTime, ParameterError> {
        self.validate()?;
        match self {
            Distribution::Delay { time } => Ok(SimTime::new(time.value().unwrap_or_default())),
            Distribution::Exponential { rate } => {
                let rate = rate.value().unwrap_or(f64::NAN);
                let u: f64 = rng.sample(Open01);
                Ok(SimTime::new(-u.ln() / rate))
            }
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.param())
    }
}

/// Failure to resolve a law against the model's variables.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    UnknownVariable(String),
    Parameter(ParameterError),
}
