//! Core traits for querying a running system.

use relia_types::{AutomatonId, SimTime, StateId, Value, VariableId};

/// Read-only view of a running system.
///
/// This is what guards and probes see: the simulated clock, the active state
/// of every automaton and the value of every variable. Implementations must
/// be cheap to query; the scheduler consults guards after every firing.
pub trait SystemView {
    /// Current simulated time.
    fn now(&self) -> SimTime;

    /// Active state of an automaton.
    fn active_state(&self, automaton: AutomatonId) -> StateId;

    /// Current value of a variable.
    fn variable(&self, variable: VariableId) -> Value;

    /// Check whether `automaton` is currently in `state`.
    fn is_in(&self, automaton: AutomatonId, state: StateId) -> bool {
        self.active_state(automaton) == state
    }
}

/// An enabling condition attached to a transition.
///
/// The engine treats guards as opaque predicates. A transition is enabled
/// only while its source state is active **and** its guard holds:
///
/// - When the guard starts holding while the source is active, the
///   transition is scheduled with a fresh sample.
/// - When the guard stops holding, a pending **interruptible** transition is
///   cancelled and its timer is lost. A non-interruptible one keeps running.
///
/// # Guarantees expected from implementations
///
/// - **Pure**: no side effects, no interior mutability
/// - **Deterministic**: same view, same answer
///
/// # Example
///
/// ```ignore
/// // Repair can only start while the crew is available.
/// let crew = model.automaton_id("Crew", "status").unwrap();
/// let available = model.state_id(crew, "available").unwrap();
/// model.set_guard_by_name("Pump", "health", "repair", move |view: &dyn SystemView| {
///     view.is_in(crew, available)
/// })?;
/// ```
pub trait Guard: Send + Sync {
    /// Whether the enabling condition holds in the given view.
    fn holds(&self, view: &dyn SystemView) -> bool;
}

impl<F> Guard for F
where
    F: Fn(&dyn SystemView) -> bool + Send + Sync,
{
    fn holds(&self, view: &dyn SystemView) -> bool {
        self(view)
    }
}

/// A user-supplied observed quantity.
///
/// Indicators usually observe a state membership or a variable; a probe
/// computes an arbitrary scalar from the whole view instead. Booleans are
/// reported as 1 and 0.
pub trait Probe: Send + Sync {
    /// Observe the system.
    fn observe(&self, view: &dyn SystemView) -> f64;
}

impl<F> Probe for F
where
    F: Fn(&dyn SystemView) -> f64 + Send + Sync,
{
    fn observe(&self, view: &dyn SystemView) -> f64 {
        self(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedView {
        state: StateId,
    }

    impl SystemView for FixedView {
        fn now(&self) -> SimTime {
            SimTime::new(3.0)
        }

        fn active_state(&self, _automaton: AutomatonId) -> StateId {
            self.state
        }

        fn variable(&self, _variable: VariableId) -> Value {
            Value::Int(4)
        }
    }

    #[test]
    fn test_closure_guard() {
        let view = FixedView { state: StateId(1) };
        let guard = |view: &dyn SystemView| view.is_in(AutomatonId(0), StateId(1));
        assert!(guard.holds(&view));

        let other = FixedView { state: StateId(2) };
        assert!(!guard.holds(&other));
    }

    #[test]
    fn test_closure_probe() {
        let view = FixedView { state: StateId(1) };
        let probe = |view: &dyn SystemView| view.variable(VariableId(0)).as_f64() * 2.0;
        assert_eq!(probe.observe(&view), 8.0);
    }
}
