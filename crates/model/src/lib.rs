//! Immutable model of a system of stochastic automata.
//!
//! A [`Model`] is an arena of value-typed entities (components, variables,
//! automata, states, transitions) addressed by the identifiers from
//! `relia-types`. It is built and validated once from a `SystemSpec` and then
//! shared read-only by every replication; live state (active states, the
//! clock, pending events) lives in the simulation crate.
//!
//! ```text
//! Model
//!  ├── components ── automata ──┬── states ── outgoing transitions
//!  │                            └── transitions (source, target, law, guard)
//!  └── variables (typed, constant during a run)
//! ```

mod automaton;
mod component;
mod model;

pub use automaton::{Automaton, State, Transition};
pub use component::{Component, Variable};
pub use model::Model;
