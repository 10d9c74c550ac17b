//! Study files: a system, its indicators and simulation parameters in TOML.
//!
//! ```toml
//! [system]
//! name = "plant"
//!
//! [[system.components]]
//! name = "Pump"
//! variables = [{ name = "lambda", type = "float", init = 0.001 }]
//!
//! [[system.components.automata]]
//! name = "health"
//! states = ["ok", "failed"]
//! transitions = [
//!     { name = "fail", source = "ok", target = "failed", occ_law = { dist = "exp", rate = "Pump.lambda" } },
//!     { name = "repair", source = "failed", target = "ok", occ_law = { dist = "delay", time = 24.0 }, interruptible = false },
//! ]
//!
//! [[indicators]]
//! name = "pump_down"
//! measure = "sojourn-time"
//! target = { observe = "state", component = "Pump", automaton = "health", state = "failed" }
//!
//! [simulation]
//! nb_runs = 1000
//! schedule = [{ start = 0.0, end = 8760.0, nvalues = 13 }]
//! ```

use crate::config::SimulationParams;
use crate::runner::MonteCarloRunner;
use crate::RunnerError;
use relia_indicators::{Indicator, IndicatorEngine, VariableTemplate};
use relia_model::Model;
use relia_types::SystemSpec;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Parsed, not yet validated, study file.
#[derive(Clone, Debug, Deserialize)]
pub struct StudyFile {
    pub system: SystemSpec,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
    /// Templates expanded over matching component variables.
    #[serde(default)]
    pub variable_indicators: Vec<VariableTemplate>,
    #[serde(default)]
    pub simulation: SimulationParams,
}

impl StudyFile {
    pub fn from_toml(source: &str) -> Result<Self, RunnerError> {
        toml::from_str(source).map_err(|e| RunnerError::Study(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Build the model, register every indicator and check the parameters.
    pub fn build(self) -> Result<Study, RunnerError> {
        let model = Arc::new(Model::from_spec(&self.system)?);
        let mut engine = IndicatorEngine::new(Arc::clone(&model));
        for indicator in self.indicators {
            engine.register(indicator)?;
        }
        for template in &self.variable_indicators {
            engine.register_variables(template)?;
        }
        self.simulation.validate()?;

        info!(
            system = %model.name(),
            components = model.components().len(),
            automata = model.automata().len(),
            indicators = engine.len(),
            "Loaded study"
        );
        Ok(Study {
            model,
            engine,
            params: self.simulation,
        })
    }
}

/// A validated study, ready to run.
pub struct Study {
    pub model: Arc<Model>,
    pub engine: IndicatorEngine,
    pub params: SimulationParams,
}

impl Study {
    pub fn into_runner(self) -> Result<MonteCarloRunner, RunnerError> {
        MonteCarloRunner::new(self.engine, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relia_indicators::ConfigurationError;
    use relia_types::ModelError;

    const STUDY: &str = r#"
        [system]
        name = "plant"

        [[system.components]]
        name = "Pump"
        variables = [{ name = "lambda", type = "float", init = 0.5 }]

        [[system.components.automata]]
        name = "health"
        states = ["ok", "failed"]
        transitions = [
            { name = "fail", source = "ok", target = "failed", occ_law = { dist = "exp", rate = "Pump.lambda" } },
            { name = "repair", source = "failed", target = "ok", occ_law = { dist = "delay", time = 2.0 }, interruptible = false },
        ]

        [[indicators]]
        name = "down"
        measure = "sojourn-time"
        stats = ["mean", "stddev"]
        target = { observe = "state", component = "Pump", automaton = "health", state = "failed" }

        [[variable_indicators]]
        component = "Pump"
        var = "lambda"
        operator = ">"
        value = 0.1

        [simulation]
        nb_runs = 50
        seed = 11
        schedule = [{ start = 0.0, end = 10.0, nvalues = 3 }]
    "#;

    #[test]
    fn test_load_and_run_study() {
        let study = StudyFile::from_toml(STUDY).unwrap().build().unwrap();
        assert_eq!(study.engine.len(), 2);
        assert!(study.engine.get("Pump_lambda").is_some());

        let report = study.into_runner().unwrap().run().unwrap();
        assert_eq!(report.completed, 50);
        assert_eq!(report.instants.len(), 3);
        // lambda > 0.1 holds throughout.
        let lambda = report.indicator("Pump_lambda").unwrap();
        assert_eq!(lambda.column(relia_indicators::Stat::Mean).unwrap(), &[Some(1.0); 3]);
    }

    #[test]
    fn test_model_errors_surface_at_build() {
        let broken = STUDY.replace(r#"target = "failed", occ_law"#, r#"target = "broken", occ_law"#);
        let err = StudyFile::from_toml(&broken).unwrap().build().err().unwrap();
        assert!(matches!(
            err,
            RunnerError::Model(ModelError::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn test_indicator_errors_surface_at_build() {
        let broken = STUDY.replace(r#"state = "failed" }"#, r#"state = "melted" }"#);
        let err = StudyFile::from_toml(&broken).unwrap().build().err().unwrap();
        assert!(matches!(
            err,
            RunnerError::Configuration(ConfigurationError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let err = StudyFile::from_toml("[system").err().unwrap();
        assert!(matches!(err, RunnerError::Study(_)));
    }
}
