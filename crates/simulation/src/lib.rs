//! Event-driven simulation of a system of stochastic automata.
//!
//! A [`System`] runs one replication of a shared, immutable `Model`. Given
//! the same model and the same random stream, it produces identical
//! timelines every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        System                           │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  Event Queue (BTreeMap<EventKey, TransitionId>)    │ │
//! │  │  Ordered by: time, sequence                        │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ earliest event              │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  active: Vec<StateId>   (one per automaton)        │ │
//! │  │  fire → cancel interruptible siblings              │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ state entered               │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  enable outgoing transitions → sample → schedule   │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod event_queue;
mod snapshot;
mod system;

pub use event_queue::{EventKey, EventQueue};
pub use snapshot::{ActiveTransition, ComponentStatus, StatusKind};
pub use system::{Step, System};

use relia_types::{ParameterError, SimTime};
use thiserror::Error;

/// Errors raised while a replication is running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A scheduled interruptible event no longer matches its automaton.
    ///
    /// Interruptible transitions are cancelled when their source state is
    /// left, so this indicates a scheduler bug rather than a model error.
    #[error(
        "internal consistency error at {time}: {transition} scheduled from {from_state} but automaton is in {active}"
    )]
    InternalConsistency {
        transition: String,
        from_state: String,
        active: String,
        time: SimTime,
    },

    /// Sampling was asked of a system that already left `t = 0`.
    #[error("system must be at t = 0 to start a replication, but is at {now}")]
    NotAtStart { now: SimTime },

    /// A law could not be sampled, or the sampling schedule is malformed.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
