//! Indicators: quantities sampled from running systems at fixed instants.
//!
//! An [`Indicator`] pairs an [`Observable`] (an automaton state, a variable
//! test, a raw variable value or a user [`Probe`](relia_core::Probe)) with a
//! [`Measure`] and the [`Stat`]s to report. The [`IndicatorEngine`] binds
//! definitions to a model, drives one [`System`](relia_simulation::System)
//! through the sampling instants, and yields a [`ReplicationSample`]; an
//! [`IndicatorAccumulator`] folds samples into running statistics.

mod engine;
mod error;
mod indicator;
mod measure;
mod observable;
mod stats;
mod tracker;

pub use engine::{IndicatorAccumulator, IndicatorEngine, ReplicationSample, CANCEL_POLL_INTERVAL};
pub use error::ConfigurationError;
pub use indicator::{Indicator, VariableTemplate};
pub use measure::{Measure, Stat};
pub use observable::{Observable, Operator};
pub use stats::RunningStats;
pub use tracker::MeasureTracker;
