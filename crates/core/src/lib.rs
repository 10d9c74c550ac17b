//! Core traits for stochastic automata simulation.
//!
//! The engine never evaluates guard expressions or indicator formulas itself.
//! It asks opaque predicates and probes through the traits defined here,
//! handing them a read-only [`SystemView`] of the running system.

mod traits;

pub use traits::{Guard, Probe, SystemView};
