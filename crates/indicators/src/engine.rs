//! Indicator registry and per-replication sampling.

use crate::indicator::{Indicator, VariableTemplate};
use crate::observable::Target;
use crate::stats::RunningStats;
use crate::tracker::MeasureTracker;
use crate::ConfigurationError;
use indexmap::IndexMap;
use regex::Regex;
use relia_core::SystemView;
use relia_model::Model;
use relia_simulation::{SimulationError, System};
use relia_types::{ParameterError, SimTime};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info};

/// Firings between two polls of the cancellation predicate during a run.
pub const CANCEL_POLL_INTERVAL: u64 = 256;

struct Registered {
    indicator: Indicator,
    target: Target,
}

/// Registered indicators of one model.
///
/// Every definition is checked against the model when it is registered, so
/// sampling never fails on a bad name.
pub struct IndicatorEngine {
    model: Arc<Model>,
    indicators: IndexMap<String, Registered>,
}

impl IndicatorEngine {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            indicators: IndexMap::new(),
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Register an indicator.
    pub fn register(&mut self, mut indicator: Indicator) -> Result<(), ConfigurationError> {
        if self.indicators.contains_key(&indicator.name) {
            return Err(ConfigurationError::DuplicateIndicator(indicator.name));
        }
        if indicator.stats.is_empty() {
            return Err(ConfigurationError::NoStatistic(indicator.name));
        }
        let mut seen = Vec::with_capacity(indicator.stats.len());
        indicator.stats.retain(|s| {
            let fresh = !seen.contains(s);
            seen.push(*s);
            fresh
        });

        let target = indicator.target.bind(&self.model, &indicator.name)?;
        debug!(
            indicator = %indicator.name,
            target = %indicator.target,
            measure = %indicator.measure,
            "Registered indicator"
        );
        self.indicators
            .insert(indicator.name.clone(), Registered { indicator, target });
        Ok(())
    }

    /// Register one variable indicator per matching `(component, variable)`.
    ///
    /// Returns the names of the registered indicators, in model order.
    pub fn register_variables(
        &mut self,
        template: &VariableTemplate,
    ) -> Result<Vec<String>, ConfigurationError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
        };
        let component_re = compile(&template.component)?;
        let variable_re = compile(&template.variable)?;

        let model = Arc::clone(&self.model);
        let mut generated = Vec::new();
        for component in model.components() {
            if !component_re.is_match(component.name()) {
                continue;
            }
            for var_id in component.variables() {
                let variable = model.variable(var_id);
                if variable_re.is_match(variable.name()) {
                    generated.push(template.instantiate(component.name(), variable.name()));
                }
            }
        }

        let names: Vec<String> = generated.iter().map(|i| i.name.clone()).collect();
        for indicator in generated {
            self.register(indicator)?;
        }
        info!(
            component = %template.component,
            variable = %template.variable,
            count = names.len(),
            "Expanded variable indicators"
        );
        Ok(names)
    }

    /// Registered indicators, in registration order.
    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> + '_ {
        self.indicators.values().map(|r| &r.indicator)
    }

    pub fn get(&self, name: &str) -> Option<&Indicator> {
        self.indicators.get(name).map(|r| &r.indicator)
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Run a fresh system through `instants` and sample every indicator.
    ///
    /// `instants` must be sorted ascending and `system` must be at `t = 0`.
    /// The system is driven with [`System::run_to_observed`] and observed
    /// after every firing, so measures are never computed retroactively.
    pub fn sample_replication(
        &self,
        system: &mut System,
        instants: &[SimTime],
    ) -> Result<ReplicationSample, SimulationError> {
        self.sample_replication_until(system, instants, || true)
            .map(|sample| sample.unwrap_or_else(|| ReplicationSample::empty(self.len())))
    }

    /// Like [`sample_replication`](Self::sample_replication), giving up as
    /// soon as `keep_going` returns false.
    ///
    /// `keep_going` is polled before every instant and every
    /// [`CANCEL_POLL_INTERVAL`] firings in between. Returns `None` for an
    /// abandoned replication.
    pub fn sample_replication_until<F>(
        &self,
        system: &mut System,
        instants: &[SimTime],
        mut keep_going: F,
    ) -> Result<Option<ReplicationSample>, SimulationError>
    where
        F: FnMut() -> bool,
    {
        if system.now() != SimTime::ZERO {
            return Err(SimulationError::NotAtStart { now: system.now() });
        }
        if let Some(w) = instants.windows(2).find(|w| w[0] > w[1]) {
            return Err(ParameterError::UnsortedSchedule {
                previous: w[0].as_f64(),
                next: w[1].as_f64(),
            }
            .into());
        }

        let registered: Vec<&Registered> = self.indicators.values().collect();
        let mut trackers: Vec<MeasureTracker> = registered
            .iter()
            .map(|r| MeasureTracker::new(r.target.observe(&*system)))
            .collect();
        let mut values = vec![Vec::with_capacity(instants.len()); registered.len()];
        let mut firings = 0u64;

        for &instant in instants {
            if !keep_going() {
                return Ok(None);
            }

            let flow = system.run_to_observed(instant, |sys| {
                let now = sys.now();
                for (tracker, r) in trackers.iter_mut().zip(&registered) {
                    tracker.observe(now, r.target.observe(sys));
                }
                firings += 1;
                if firings % CANCEL_POLL_INTERVAL == 0 && !keep_going() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })?;
            if flow.is_break() {
                debug!(time = %system.now(), firings, "Replication abandoned mid-run");
                return Ok(None);
            }

            let now = system.now();
            for (i, (tracker, r)) in trackers.iter_mut().zip(&registered).enumerate() {
                tracker.observe(now, r.target.observe(&*system));
                values[i].push(tracker.measure(r.indicator.measure));
            }
        }

        Ok(Some(ReplicationSample { values }))
    }
}

/// Measures of one replication, indexed by indicator then instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationSample {
    values: Vec<Vec<f64>>,
}

impl ReplicationSample {
    fn empty(indicators: usize) -> Self {
        Self {
            values: vec![Vec::new(); indicators],
        }
    }

    /// Value of indicator `indicator` at instant number `instant`.
    pub fn get(&self, indicator: usize, instant: usize) -> Option<f64> {
        self.values.get(indicator)?.get(instant).copied()
    }

    /// Values of one indicator, one per instant.
    pub fn indicator(&self, indicator: usize) -> &[f64] {
        &self.values[indicator]
    }
}

/// Statistics per (indicator, instant) over many replications.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorAccumulator {
    cells: Vec<Vec<RunningStats>>,
    replications: u64,
}

impl IndicatorAccumulator {
    pub fn new(indicators: usize, instants: usize) -> Self {
        Self {
            cells: vec![vec![RunningStats::new(); instants]; indicators],
            replications: 0,
        }
    }

    /// Fold in one replication.
    pub fn add(&mut self, sample: &ReplicationSample) {
        for (row, values) in self.cells.iter_mut().zip(&sample.values) {
            for (cell, &x) in row.iter_mut().zip(values) {
                cell.push(x);
            }
        }
        self.replications += 1;
    }

    /// Fold in another accumulator over the same indicators and instants.
    pub fn merge(&mut self, other: &IndicatorAccumulator) {
        for (row, other_row) in self.cells.iter_mut().zip(&other.cells) {
            for (cell, other_cell) in row.iter_mut().zip(other_row) {
                cell.merge(other_cell);
            }
        }
        self.replications += other.replications;
    }

    /// Number of replications folded in.
    pub fn replications(&self) -> u64 {
        self.replications
    }

    pub fn cell(&self, indicator: usize, instant: usize) -> &RunningStats {
        &self.cells[indicator][instant]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Measure, Observable, Operator, Stat};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use relia_test_helpers::{cycle_system, pump_system};
    use tracing_test::traced_test;

    fn engine_for(spec: relia_types::SystemSpec) -> IndicatorEngine {
        IndicatorEngine::new(Arc::new(Model::from_spec(&spec).unwrap()))
    }

    fn instants(values: &[f64]) -> Vec<SimTime> {
        values.iter().map(|&v| SimTime::new(v)).collect()
    }

    #[traced_test]
    #[test]
    fn test_measures_on_deterministic_cycle() {
        // off on [2, 5) and [7, 10); on again at 10.
        let mut engine = engine_for(cycle_system());
        let off = Observable::state("Lamp", "power", "off");
        for measure in [
            Measure::Value,
            Measure::SojournTime,
            Measure::NbOccurrences,
            Measure::HadValue,
        ] {
            engine
                .register(Indicator::new(measure.as_str(), off.clone()).with_measure(measure))
                .unwrap();
        }

        let times = instants(&[1.0, 3.0, 6.0, 10.0]);
        let mut system = System::new(Arc::clone(engine.model()), ChaCha8Rng::seed_from_u64(0))
            .unwrap()
            .with_horizon(SimTime::new(10.0));
        let sample = engine.sample_replication(&mut system, &times).unwrap();

        assert_eq!(sample.indicator(0), &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(sample.indicator(1), &[0.0, 1.0, 3.0, 6.0]);
        assert_eq!(sample.indicator(2), &[0.0, 1.0, 1.0, 2.0]);
        assert_eq!(sample.indicator(3), &[0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_abandoned_replication() {
        let mut engine = engine_for(cycle_system());
        engine
            .register(Indicator::new("on", Observable::state("Lamp", "power", "on")))
            .unwrap();
        let mut system =
            System::new(Arc::clone(engine.model()), ChaCha8Rng::seed_from_u64(0)).unwrap();

        let mut budget = 1;
        let sample = engine
            .sample_replication_until(&mut system, &instants(&[1.0, 2.0]), || {
                budget -= 1;
                budget >= 0
            })
            .unwrap();
        assert_eq!(sample, None);
    }

    #[test]
    fn test_abandoned_mid_run() {
        let mut engine = engine_for(cycle_system());
        engine
            .register(Indicator::new("on", Observable::state("Lamp", "power", "on")))
            .unwrap();
        let mut system =
            System::new(Arc::clone(engine.model()), ChaCha8Rng::seed_from_u64(0)).unwrap();

        // One instant far away: only the in-run poll can stop it.
        let mut polls = 0;
        let sample = engine
            .sample_replication_until(&mut system, &instants(&[1.0e6]), || {
                polls += 1;
                polls < 2
            })
            .unwrap();
        assert_eq!(sample, None);
        assert_eq!(polls, 2);
        assert_eq!(system.fired_count(), CANCEL_POLL_INTERVAL);
        assert!(system.now() < SimTime::new(1.0e6));
    }

    #[test]
    fn test_unsorted_instants_are_rejected() {
        let mut engine = engine_for(cycle_system());
        engine
            .register(Indicator::new("on", Observable::state("Lamp", "power", "on")))
            .unwrap();
        let mut system =
            System::new(Arc::clone(engine.model()), ChaCha8Rng::seed_from_u64(0)).unwrap();

        let err = engine
            .sample_replication(&mut system, &instants(&[1.0, 5.0, 3.0]))
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::Parameter(ParameterError::UnsortedSchedule {
                previous: 5.0,
                next: 3.0
            })
        );
        assert_eq!(system.fired_count(), 0);

        system.run_to(SimTime::new(4.0)).unwrap();
        let err = engine
            .sample_replication(&mut system, &instants(&[5.0]))
            .unwrap_err();
        assert!(matches!(err, SimulationError::NotAtStart { .. }));
    }

    #[test]
    fn test_registration_errors() {
        let mut engine = engine_for(pump_system());
        engine
            .register(Indicator::new("down", Observable::state("Pump", "health", "failed")))
            .unwrap();

        assert_eq!(
            engine.register(Indicator::new("down", Observable::state("Pump", "health", "ok"))),
            Err(ConfigurationError::DuplicateIndicator("down".into()))
        );
        assert_eq!(
            engine.register(
                Indicator::new("none", Observable::state("Pump", "health", "ok")).with_stats([])
            ),
            Err(ConfigurationError::NoStatistic("none".into()))
        );
        assert!(matches!(
            engine.register(Indicator::new("x", Observable::value("Pump", "pressure"))),
            Err(ConfigurationError::UnknownTarget {
                kind: "variable",
                ..
            })
        ));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_duplicate_stats_collapse() {
        let mut engine = engine_for(pump_system());
        engine
            .register(
                Indicator::new("down", Observable::state("Pump", "health", "failed"))
                    .with_stats([Stat::Mean, Stat::StdDev, Stat::Mean]),
            )
            .unwrap();
        assert_eq!(
            engine.get("down").unwrap().stats,
            vec![Stat::Mean, Stat::StdDev]
        );
    }

    #[traced_test]
    #[test]
    fn test_register_variables_expands_matches() {
        let mut engine = engine_for(pump_system());
        let names = engine
            .register_variables(&VariableTemplate::default())
            .unwrap();
        assert_eq!(names, vec!["Pump_lambda", "Pump_spare"]);

        let names = engine
            .register_variables(
                &VariableTemplate::new("^Pump$", "spa")
                    .with_name("spare")
                    .with_test(Operator::Eq, true)
                    .with_measure(Measure::SojournTime),
            )
            .unwrap();
        assert_eq!(names, vec!["spare_spare_sojourn-time"]);
        assert!(logs_contain("Expanded variable indicators"));
    }

    #[test]
    fn test_register_variables_invalid_pattern() {
        let mut engine = engine_for(pump_system());
        let err = engine
            .register_variables(&VariableTemplate::new("(", ".*"))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_accumulator_merge_in_order() {
        let sample = |x: f64| ReplicationSample {
            values: vec![vec![x, 2.0 * x]],
        };

        let mut whole = IndicatorAccumulator::new(1, 2);
        for x in [1.0, 2.0, 3.0, 4.0] {
            whole.add(&sample(x));
        }

        let mut left = IndicatorAccumulator::new(1, 2);
        left.add(&sample(1.0));
        left.add(&sample(2.0));
        let mut right = IndicatorAccumulator::new(1, 2);
        right.add(&sample(3.0));
        right.add(&sample(4.0));
        left.merge(&right);

        assert_eq!(left.replications(), 4);
        assert_eq!(left.cell(0, 1).mean(), Some(5.0));
        assert_eq!(whole.cell(0, 0).mean(), Some(2.5));
    }
}
