//! Indicator definitions.

use crate::measure::{Measure, Stat};
use crate::observable::{Observable, Operator};
use relia_types::Value;
use serde::Deserialize;

fn default_stats() -> Vec<Stat> {
    vec![Stat::Mean]
}

fn any_name() -> String {
    ".*".to_string()
}

fn default_test_value() -> Value {
    Value::Bool(true)
}

/// A named quantity estimated at every sampling instant.
///
/// Deserializes from a study file entry:
///
/// ```toml
/// [[indicators]]
/// name = "pump_down"
/// measure = "sojourn-time"
/// stats = ["mean", "stddev"]
/// target = { observe = "state", component = "Pump", automaton = "health", state = "failed" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Indicator {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub target: Observable,
    #[serde(default)]
    pub measure: Measure,
    #[serde(default = "default_stats")]
    pub stats: Vec<Stat>,
}

impl Indicator {
    /// An indicator reporting the mean value of `target`.
    pub fn new(name: impl Into<String>, target: Observable) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            unit: None,
            target,
            measure: Measure::default(),
            stats: default_stats(),
        }
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_stats(mut self, stats: impl IntoIterator<Item = Stat>) -> Self {
        self.stats = stats.into_iter().collect();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Long name; falls back to the name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Description; falls back to the label.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| self.label())
    }
}

/// One variable indicator per matching `(component, variable)` pair.
///
/// `component` and `variable` are regular expressions searched in the
/// names. Each generated indicator is named
/// `<name or component>_<variable>`, suffixed with `_<measure>` when a
/// measure is given explicitly.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "any_name")]
    pub component: String,
    #[serde(default = "any_name", alias = "var")]
    pub variable: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default = "default_test_value", alias = "value_test")]
    pub value: Value,
    #[serde(default)]
    pub measure: Option<Measure>,
    #[serde(default = "default_stats")]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Default for VariableTemplate {
    fn default() -> Self {
        Self {
            name: None,
            component: any_name(),
            variable: any_name(),
            operator: Operator::default(),
            value: default_test_value(),
            measure: None,
            stats: default_stats(),
            unit: None,
        }
    }
}

impl VariableTemplate {
    pub fn new(component: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            variable: variable.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_test(mut self, operator: Operator, value: impl Into<Value>) -> Self {
        self.operator = operator;
        self.value = value.into();
        self
    }

    pub fn with_measure(mut self, measure: Measure) -> Self {
        self.measure = Some(measure);
        self
    }

    pub fn with_stats(mut self, stats: impl IntoIterator<Item = Stat>) -> Self {
        self.stats = stats.into_iter().collect();
        self
    }

    /// The indicator generated for one matching pair.
    pub(crate) fn instantiate(&self, component: &str, variable: &str) -> Indicator {
        let prefix = self.name.as_deref().unwrap_or(component);
        let mut name = format!("{}_{}", prefix, variable);
        if let Some(measure) = self.measure {
            name.push('_');
            name.push_str(measure.as_str());
        }

        Indicator {
            name,
            label: None,
            description: None,
            unit: self.unit.clone(),
            target: Observable::variable(component, variable, self.operator, self.value),
            measure: self.measure.unwrap_or_default(),
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_description_fallbacks() {
        let ind = Indicator::new("down", Observable::state("Pump", "health", "failed"));
        assert_eq!(ind.label(), "down");
        assert_eq!(ind.description(), "down");

        let ind = ind.with_label("Pump down");
        assert_eq!(ind.description(), "Pump down");
    }

    #[test]
    fn test_template_naming() {
        let t = VariableTemplate::new("Pump", ".*");
        assert_eq!(t.instantiate("Pump", "spare").name, "Pump_spare");

        let t = t.with_name("avail").with_measure(Measure::HadValue);
        let ind = t.instantiate("Pump", "spare");
        assert_eq!(ind.name, "avail_spare_had-value");
        assert_eq!(ind.measure, Measure::HadValue);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let ind: Indicator = toml::from_str(
            r#"
            name = "down"
            target = { observe = "state", component = "Pump", automaton = "health", state = "failed" }
            "#,
        )
        .unwrap();
        assert_eq!(ind.measure, Measure::Value);
        assert_eq!(ind.stats, vec![Stat::Mean]);

        let err = toml::from_str::<Indicator>(
            r#"
            name = "down"
            measure = "availability"
            target = { observe = "value", component = "Pump", variable = "lambda" }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported measure"));
    }
}
