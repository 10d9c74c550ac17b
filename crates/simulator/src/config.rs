//! Configuration types for the simulator.

use relia_types::{ParameterError, SimTime};
use serde::Deserialize;
use std::time::Duration;

/// Evenly spaced sampling instants.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct InstantRange {
    pub start: f64,
    pub end: f64,
    pub nvalues: usize,
}

impl InstantRange {
    pub fn new(start: f64, end: f64, nvalues: usize) -> Self {
        Self {
            start,
            end,
            nvalues,
        }
    }

    /// The instants of the range; a range of one value or less is `[end]`.
    pub fn values(&self) -> Vec<f64> {
        if self.nvalues <= 1 {
            return vec![self.end];
        }
        let step = (self.end - self.start) / (self.nvalues - 1) as f64;
        (0..self.nvalues)
            .map(|i| {
                if i == self.nvalues - 1 {
                    self.end
                } else {
                    self.start + step * i as f64
                }
            })
            .collect()
    }
}

/// One entry of a sampling schedule.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScheduleItem {
    Instant(f64),
    Range(InstantRange),
}

impl From<f64> for ScheduleItem {
    fn from(t: f64) -> Self {
        ScheduleItem::Instant(t)
    }
}

impl From<InstantRange> for ScheduleItem {
    fn from(range: InstantRange) -> Self {
        ScheduleItem::Range(range)
    }
}

fn default_runs() -> usize {
    1
}

fn default_schedule() -> Vec<ScheduleItem> {
    vec![ScheduleItem::Instant(100.0)]
}

/// Parameters of a Monte Carlo study.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SimulationParams {
    /// Number of replications.
    #[serde(default = "default_runs")]
    pub nb_runs: usize,

    /// Base seed. Drawn from entropy (and logged) when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Unit of simulated time, for reports only.
    #[serde(default)]
    pub time_unit: Option<String>,

    /// Sampling instants; the last one is the simulation horizon.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<ScheduleItem>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            nb_runs: default_runs(),
            seed: None,
            time_unit: None,
            schedule: default_schedule(),
        }
    }
}

impl SimulationParams {
    /// `nb_runs` replications with an empty schedule.
    pub fn new(nb_runs: usize) -> Self {
        Self {
            nb_runs,
            schedule: Vec::new(),
            ..Default::default()
        }
    }

    pub fn with_runs(mut self, nb_runs: usize) -> Self {
        self.nb_runs = nb_runs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_unit(mut self, unit: impl Into<String>) -> Self {
        self.time_unit = Some(unit.into());
        self
    }

    /// Add one sampling instant.
    pub fn with_instant(mut self, t: f64) -> Self {
        self.schedule.push(ScheduleItem::Instant(t));
        self
    }

    /// Add `nvalues` evenly spaced instants from `start` to `end`.
    pub fn with_range(mut self, start: f64, end: f64, nvalues: usize) -> Self {
        self.schedule
            .push(ScheduleItem::Range(InstantRange::new(start, end, nvalues)));
        self
    }

    /// The flattened schedule, sorted ascending.
    pub fn instants(&self) -> Result<Vec<SimTime>, ParameterError> {
        let mut instants: Vec<f64> = self
            .schedule
            .iter()
            .flat_map(|item| match item {
                ScheduleItem::Instant(t) => vec![*t],
                ScheduleItem::Range(range) => range.values(),
            })
            .collect();

        if instants.is_empty() {
            return Err(ParameterError::EmptySchedule);
        }
        if let Some(&bad) = instants.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(ParameterError::InvalidInstant(bad));
        }
        instants.sort_by(f64::total_cmp);
        Ok(instants.into_iter().map(SimTime::new).collect())
    }

    /// Simulation horizon: the last sampling instant.
    pub fn t_max(&self) -> Result<SimTime, ParameterError> {
        self.instants()?
            .last()
            .copied()
            .ok_or(ParameterError::EmptySchedule)
    }

    /// Check the parameters before any replication runs.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.nb_runs < 1 {
            return Err(ParameterError::NbRuns(self.nb_runs));
        }
        self.instants().map(|_| ())
    }
}

/// Execution settings of the runner, independent of the study.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Worker threads; `None` uses one per core.
    pub threads: Option<usize>,

    /// Replications per work unit. Results depend on the chunk size (through
    /// floating-point merge order) but never on the thread count.
    pub chunk_size: usize,

    /// Wall-clock budget; replications not finished by then are cancelled.
    pub deadline: Option<Duration>,
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self {
            threads: None,
            chunk_size: 64,
            deadline: None,
        }
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set the replication chunk size (at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the wall-clock deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
