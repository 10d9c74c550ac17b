//! Core value types for stochastic automata models.
//!
//! Everything here is plain data shared by the other crates:
//!
//! - **Identifiers**: arena indices for components, automata, states,
//!   transitions and variables
//! - **Time**: [`SimTime`], a totally ordered simulated instant
//! - **Values**: typed component variables
//! - **Distributions**: the closed set of occurrence laws
//! - **Specifications**: static, already-authored model descriptions

mod distribution;
mod error;
mod identifiers;
mod spec;
mod time;
mod value;

pub use distribution::{Distribution, Param, ResolveError};
pub use error::{ModelError, ParameterError};
pub use identifiers::{AutomatonId, ComponentId, ReplicationId, StateId, TransitionId, VariableId};
pub use spec::{AutomatonSpec, ComponentSpec, SystemSpec, TransitionSpec, VariableSpec};
pub use time::SimTime;
pub use value::{Value, ValueType};
