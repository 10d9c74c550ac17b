//! Results of a Monte Carlo study.

use relia_indicators::{Measure, Stat};
use relia_types::SimTime;
use std::time::Duration;

/// One estimate: an indicator statistic at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    pub indicator: String,
    pub measure: Measure,
    pub stat: Stat,
    pub instant: f64,
    /// `None` when no replication completed.
    pub value: Option<f64>,
    pub unit: Option<String>,
}

/// Estimates of one indicator at every instant.
#[derive(Clone, Debug, PartialEq)]
pub struct IndicatorResult {
    pub name: String,
    pub label: String,
    pub description: String,
    pub unit: Option<String>,
    pub measure: Measure,
    /// One column per requested statistic, one entry per instant.
    pub values: Vec<(Stat, Vec<Option<f64>>)>,
}

impl IndicatorResult {
    /// Estimate of `stat` at instant number `instant`.
    pub fn value(&self, stat: Stat, instant: usize) -> Option<f64> {
        self.column(stat)?.get(instant).copied().flatten()
    }

    /// All estimates of `stat`, one per instant.
    pub fn column(&self, stat: Stat) -> Option<&[Option<f64>]> {
        self.values
            .iter()
            .find(|(s, _)| *s == stat)
            .map(|(_, column)| column.as_slice())
    }
}

/// Outcome of a Monte Carlo run.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    /// Name of the simulated system.
    pub system: String,
    /// Base seed actually used.
    pub seed: u64,
    pub time_unit: Option<String>,
    pub instants: Vec<SimTime>,
    pub indicators: Vec<IndicatorResult>,
    pub requested: usize,
    pub completed: u64,
    pub cancelled: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl SimulationReport {
    /// Whether every requested replication completed.
    pub fn is_complete(&self) -> bool {
        self.completed == self.requested as u64
    }

    pub fn indicator(&self, name: &str) -> Option<&IndicatorResult> {
        self.indicators.iter().find(|r| r.name == name)
    }

    /// Flat result rows, by indicator, then statistic, then instant.
    pub fn rows(&self) -> Vec<ResultRow> {
        let mut rows = Vec::new();
        for result in &self.indicators {
            for (stat, column) in &result.values {
                for (instant, value) in self.instants.iter().zip(column) {
                    rows.push(ResultRow {
                        indicator: result.name.clone(),
                        measure: result.measure,
                        stat: *stat,
                        instant: instant.as_f64(),
                        value: *value,
                        unit: result.unit.clone(),
                    });
                }
            }
        }
        rows
    }

    /// Print a human-readable summary to stdout.
    pub fn print(&self) {
        let unit = self.time_unit.as_deref().unwrap_or("");
        println!("\n=== Simulation Report: {} ===", self.system);
        println!("Seed:         {}", self.seed);
        println!(
            "Replications: {} completed, {} cancelled (of {})",
            self.completed, self.cancelled, self.requested
        );
        println!("Elapsed:      {:.2?}", self.elapsed);
        println!();
        println!(
            "{:<28} {:<15} {:<7} {:>12} {:>14}  {}",
            "indicator", "measure", "stat", "instant", "value", "unit"
        );
        for row in self.rows() {
            let value = row
                .value
                .map(|v| format!("{:.6}", v))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<28} {:<15} {:<7} {:>12} {:>14}  {}",
                row.indicator,
                row.measure.as_str(),
                row.stat.as_str(),
                format!("{}{}", row.instant, unit),
                value,
                row.unit.as_deref().unwrap_or("")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SimulationReport {
        SimulationReport {
            system: "plant".into(),
            seed: 1,
            time_unit: None,
            instants: vec![SimTime::new(1.0), SimTime::new(2.0)],
            indicators: vec![IndicatorResult {
                name: "down".into(),
                label: "down".into(),
                description: "down".into(),
                unit: None,
                measure: Measure::SojournTime,
                values: vec![
                    (Stat::Mean, vec![Some(0.5), Some(1.0)]),
                    (Stat::StdDev, vec![Some(0.0), None]),
                ],
            }],
            requested: 4,
            completed: 4,
            cancelled: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_rows_are_flattened() {
        let rows = report().rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].stat, Stat::Mean);
        assert_eq!(rows[1].instant, 2.0);
        assert_eq!(rows[1].value, Some(1.0));
        assert_eq!(rows[3].value, None);
    }

    #[test]
    fn test_lookup() {
        let report = report();
        assert!(report.is_complete());
        let down = report.indicator("down").unwrap();
        assert_eq!(down.value(Stat::Mean, 0), Some(0.5));
        assert_eq!(down.value(Stat::StdDev, 1), None);
        assert!(report.indicator("up").is_none());
    }
}
