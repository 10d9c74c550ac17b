//! Relia Simulator
//!
//! Monte Carlo estimation of dependability indicators over a system of
//! stochastic automata, built on `relia-simulation` and `relia-indicators`.
//!
//! # Architecture
//!
//! ```text
//! StudyFile (TOML) ──build──► Study { Model, IndicatorEngine, SimulationParams }
//!                                          │
//!                                          ▼
//!                               MonteCarloRunner
//!                  chunks of replications on a rayon pool
//!        ┌──────────────┬──────────────┬──────────────┐
//!        │ chunk 0      │ chunk 1      │ chunk k      │  System::reset
//!        │ Welford fold │ Welford fold │ Welford fold │  + sample_replication
//!        └──────┬───────┴──────┬───────┴──────┬───────┘
//!               └────── merged in chunk order ┘
//!                                          │
//!                                          ▼
//!                                 SimulationReport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use relia_simulator::{MonteCarloRunner, SimulationParams, SimulatorConfig, StudyFile};
//!
//! let study = StudyFile::load("plant.toml")?.build()?;
//! let runner = MonteCarloRunner::new(study.engine, study.params)?
//!     .with_config(SimulatorConfig::new().with_threads(8));
//!
//! let report = runner.run()?;
//! report.print();
//! ```

pub mod config;
pub mod report;
pub mod runner;
pub mod study;

pub use config::{InstantRange, ScheduleItem, SimulationParams, SimulatorConfig};
pub use report::{IndicatorResult, ResultRow, SimulationReport};
pub use runner::{replication_rng, MonteCarloRunner};
pub use study::{Study, StudyFile};

use relia_indicators::ConfigurationError;
use relia_simulation::SimulationError;
use relia_types::{ModelError, ParameterError};
use thiserror::Error;

/// Errors from setting up or running a study.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("invalid parameter: {0}")]
    Parameter(#[from] ParameterError),

    #[error("invalid indicator: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),

    #[error("no indicator registered")]
    NoIndicators,

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid study file: {0}")]
    Study(String),
}
