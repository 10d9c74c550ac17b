//! Monte Carlo runner.

use crate::config::{SimulationParams, SimulatorConfig};
use crate::report::{IndicatorResult, SimulationReport};
use crate::RunnerError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use relia_indicators::{IndicatorAccumulator, IndicatorEngine};
use relia_simulation::{SimulationError, System};
use relia_types::{ReplicationId, SimTime};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Random stream of one replication.
///
/// Every replication gets its own ChaCha stream of the base seed, so its
/// outcome depends only on `(seed, replication)` and never on which worker
/// ran it or in which order.
pub fn replication_rng(seed: u64, replication: ReplicationId) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(replication.0);
    rng
}

/// Partial result of a contiguous range of replications.
struct ChunkOutcome {
    accumulator: IndicatorAccumulator,
    cancelled: u64,
}

/// Stop conditions of one `run()`.
///
/// The caller's stop flag is only read. Deadline expiry is latched in a
/// flag local to the run, so a later run starts afresh.
struct Cancellation<'a> {
    stop: &'a AtomicBool,
    deadline: Option<Instant>,
    expired: AtomicBool,
}

impl Cancellation<'_> {
    fn keep_going(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) || self.expired.load(Ordering::Relaxed) {
            return false;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.expired.store(true, Ordering::Relaxed);
                false
            }
            _ => true,
        }
    }
}

/// Runs independent replications of a model and aggregates indicators.
///
/// Replications are split into fixed-size chunks processed on a rayon
/// pool. Each chunk folds its replications in order, and chunk results are
/// merged in chunk order on the calling thread, so a fixed seed gives the
/// same report bit for bit whatever the number of threads.
pub struct MonteCarloRunner {
    engine: IndicatorEngine,
    params: SimulationParams,
    config: SimulatorConfig,
    stop_flag: Arc<AtomicBool>,
}

impl MonteCarloRunner {
    /// Create a runner, checking parameters and indicators up front.
    pub fn new(engine: IndicatorEngine, params: SimulationParams) -> Result<Self, RunnerError> {
        params.validate()?;
        if engine.is_empty() {
            return Err(RunnerError::NoIndicators);
        }
        Ok(Self {
            engine,
            params,
            config: SimulatorConfig::default(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Flag that cancels the run when set.
    ///
    /// Replications in progress stop within a few hundred firings and
    /// contribute no samples. The runner never clears or sets it.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Run every replication and aggregate the indicators.
    pub fn run(&self) -> Result<SimulationReport, RunnerError> {
        let started = Instant::now();
        let instants = self.params.instants()?;
        let t_max = instants
            .last()
            .copied()
            .ok_or(relia_types::ParameterError::EmptySchedule)?;

        let seed = self.params.seed.unwrap_or_else(|| {
            let seed = rand::random::<u64>();
            info!(seed, "No seed given, drew one from entropy");
            seed
        });

        let nb_runs = self.params.nb_runs as u64;
        let chunk_size = self.config.chunk_size.max(1) as u64;
        let chunks: Vec<Range<u64>> = (0..nb_runs)
            .step_by(chunk_size as usize)
            .map(|start| start..(start + chunk_size).min(nb_runs))
            .collect();

        info!(
            system = %self.engine.model().name(),
            runs = nb_runs,
            chunks = chunks.len(),
            instants = instants.len(),
            t_max = %t_max,
            seed,
            "Starting Monte Carlo run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.unwrap_or(0))
            .build()
            .map_err(|e| RunnerError::ThreadPool(e.to_string()))?;
        let cancel = Cancellation {
            stop: self.stop_flag.as_ref(),
            deadline: self.config.deadline.map(|d| started + d),
            expired: AtomicBool::new(false),
        };

        let outcomes: Vec<ChunkOutcome> = pool.install(|| {
            chunks
                .par_iter()
                .map(|range| self.run_chunk(range.clone(), seed, &instants, t_max, &cancel))
                .collect::<Result<Vec<_>, SimulationError>>()
        })?;

        let mut total = IndicatorAccumulator::new(self.engine.len(), instants.len());
        let mut cancelled = 0;
        for outcome in &outcomes {
            total.merge(&outcome.accumulator);
            cancelled += outcome.cancelled;
        }

        if cancelled > 0 {
            warn!(
                completed = total.replications(),
                cancelled, "Monte Carlo run cancelled before completion"
            );
        }

        let report = self.build_report(seed, instants, &total, cancelled, started);
        info!(
            completed = report.completed,
            elapsed = ?report.elapsed,
            "Monte Carlo run finished"
        );
        Ok(report)
    }

    fn run_chunk(
        &self,
        range: Range<u64>,
        seed: u64,
        instants: &[SimTime],
        t_max: SimTime,
        cancel: &Cancellation<'_>,
    ) -> Result<ChunkOutcome, SimulationError> {
        let mut outcome = ChunkOutcome {
            accumulator: IndicatorAccumulator::new(self.engine.len(), instants.len()),
            cancelled: 0,
        };
        let keep_going = || cancel.keep_going();

        let model = Arc::clone(self.engine.model());
        let mut system = System::new(model, replication_rng(seed, ReplicationId(range.start)))?
            .with_horizon(t_max);

        debug!(first = range.start, end = range.end, "Running chunk");
        for replication in range {
            if !keep_going() {
                outcome.cancelled += 1;
                continue;
            }
            system.reset(replication_rng(seed, ReplicationId(replication)))?;
            match self
                .engine
                .sample_replication_until(&mut system, instants, keep_going)?
            {
                Some(sample) => outcome.accumulator.add(&sample),
                None => outcome.cancelled += 1,
            }
        }
        Ok(outcome)
    }

    fn build_report(
        &self,
        seed: u64,
        instants: Vec<SimTime>,
        total: &IndicatorAccumulator,
        cancelled: u64,
        started: Instant,
    ) -> SimulationReport {
        let indicators = self
            .engine
            .indicators()
            .enumerate()
            .map(|(i, indicator)| IndicatorResult {
                name: indicator.name.clone(),
                label: indicator.label().to_string(),
                description: indicator.description().to_string(),
                unit: indicator.unit.clone(),
                measure: indicator.measure,
                values: indicator
                    .stats
                    .iter()
                    .map(|&stat| {
                        let column = (0..instants.len())
                            .map(|j| total.cell(i, j).get(stat))
                            .collect();
                        (stat, column)
                    })
                    .collect(),
            })
            .collect();

        SimulationReport {
            system: self.engine.model().name().to_string(),
            seed,
            time_unit: self.params.time_unit.clone(),
            instants,
            indicators,
            requested: self.params.nb_runs,
            completed: total.replications(),
            cancelled,
            elapsed: started.elapsed(),
        }
    }
}
