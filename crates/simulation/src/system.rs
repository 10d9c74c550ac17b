//! The per-replication system: live automaton states, clock and scheduler.

use crate::event_queue::EventQueue;
use crate::snapshot::{ActiveTransition, ComponentStatus, StatusKind};
use crate::SimulationError;
use rand_chacha::ChaCha8Rng;
use relia_core::SystemView;
use relia_model::Model;
use relia_types::{AutomatonId, SimTime, StateId, TransitionId, Value, VariableId};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::trace;

/// Outcome of a single [`System::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// A transition fired at the given time.
    Fired {
        transition: TransitionId,
        time: SimTime,
    },
    /// The next event lies beyond the horizon; nothing happened.
    Horizon,
    /// No event is pending; every automaton is quiescent.
    Idle,
}

/// A running system of automata.
///
/// Owns everything that changes during a replication: the active state of
/// each automaton, the clock, the pending events and the random stream. The
/// [`Model`] itself is shared and never mutated.
///
/// # Firing rules
///
/// - Entering a state enables each outgoing transition whose guard holds and
///   that is not already pending; it is scheduled at `now + sample()`.
/// - Firing a transition moves its automaton to the target, cancels the
///   other **interruptible** pending transitions leaving the previous active
///   state, and enables the target's outgoing transitions.
/// - **Non-interruptible** pending transitions keep their original firing
///   time whatever happens to their automaton in between, and always
///   complete into their target.
/// - After every firing, guards of all automata are re-evaluated.
///
/// Events at the same instant fire in scheduling order.
pub struct System {
    model: Arc<Model>,
    clock: SimTime,
    horizon: SimTime,
    active: Vec<StateId>,
    queue: EventQueue,
    rng: ChaCha8Rng,
    fired: u64,
    has_guards: bool,
}

impl System {
    /// Create a system in its initial configuration.
    ///
    /// Every automaton starts in its initial state and the transitions of
    /// the initial states are enabled. The horizon is unbounded until set
    /// with [`with_horizon`](Self::with_horizon).
    pub fn new(model: Arc<Model>, rng: ChaCha8Rng) -> Result<Self, SimulationError> {
        let has_guards = model.transitions().iter().any(|t| t.is_guarded());
        let mut system = Self {
            active: Vec::with_capacity(model.automata().len()),
            model,
            clock: SimTime::ZERO,
            horizon: SimTime::NEVER,
            queue: EventQueue::new(),
            rng,
            fired: 0,
            has_guards,
        };
        system.start()?;
        Ok(system)
    }

    /// Set the terminal time `t_max`.
    pub fn with_horizon(mut self, horizon: SimTime) -> Self {
        self.horizon = horizon;
        self
    }

    /// Put every automaton back in its initial state with a new random stream.
    pub fn reset(&mut self, rng: ChaCha8Rng) -> Result<(), SimulationError> {
        self.rng = rng;
        self.start()
    }

    fn start(&mut self) -> Result<(), SimulationError> {
        self.clock = SimTime::ZERO;
        self.fired = 0;
        self.queue.clear();
        self.active = self
            .model
            .automata()
            .iter()
            .map(|a| a.init_state())
            .collect();

        for idx in 0..self.active.len() {
            let state = self.active[idx];
            self.enable_state(state)?;
        }
        self.refresh_guards()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════════

    /// Fire the earliest pending event, unless it lies beyond the horizon.
    pub fn advance(&mut self) -> Result<Step, SimulationError> {
        let Some((key, _)) = self.queue.peek() else {
            return Ok(Step::Idle);
        };
        if key.time > self.horizon {
            return Ok(Step::Horizon);
        }

        let Some((key, transition)) = self.queue.pop() else {
            return Ok(Step::Idle);
        };
        self.clock = self.clock.max(key.time);
        self.fire(transition)?;
        Ok(Step::Fired {
            transition,
            time: key.time,
        })
    }

    /// Fire every event up to and including `until` (capped at the horizon),
    /// then move the clock to that time.
    ///
    /// Returns the number of transitions fired.
    pub fn run_to(&mut self, until: SimTime) -> Result<u64, SimulationError> {
        match self.run_to_observed(until, |_| ControlFlow::Continue(()))? {
            ControlFlow::Continue(fired) | ControlFlow::Break(fired) => Ok(fired),
        }
    }

    /// Like [`run_to`](Self::run_to), calling `observer` after every firing.
    ///
    /// The observer sees the system right after the firing, with the clock
    /// at the firing time. It is how indicators follow state changes between
    /// sampling instants without resampling the past.
    ///
    /// When the observer breaks, the run stops right there and the clock
    /// stays at the last firing time. The count of fired transitions is
    /// returned in the matching variant.
    pub fn run_to_observed<F>(
        &mut self,
        until: SimTime,
        mut observer: F,
    ) -> Result<ControlFlow<u64, u64>, SimulationError>
    where
        F: FnMut(&System) -> ControlFlow<()>,
    {
        let target = until.min(self.horizon);
        let mut fired = 0;
        while let Some(time) = self.next_event_time() {
            if time > target {
                break;
            }
            if let Step::Fired { .. } = self.advance()? {
                fired += 1;
                if observer(self).is_break() {
                    return Ok(ControlFlow::Break(fired));
                }
            }
        }
        self.clock = self.clock.max(target);
        Ok(ControlFlow::Continue(fired))
    }

    /// Cancel a pending interruptible transition.
    ///
    /// This is the hook for enabling conditions evaluated outside the
    /// engine. Non-interruptible transitions cannot be cancelled; the call
    /// returns `false` for them and for transitions that are not pending.
    pub fn interrupt(&mut self, transition: TransitionId) -> bool {
        if !self.model.transition(transition).is_interruptible() {
            return false;
        }
        let cancelled = self.queue.cancel(transition).is_some();
        if cancelled {
            trace!(
                time = %self.clock,
                transition = %self.model.transition(transition).name(),
                "Interrupted transition"
            );
        }
        cancelled
    }

    fn fire(&mut self, transition: TransitionId) -> Result<(), SimulationError> {
        let model = Arc::clone(&self.model);
        let trans = model.transition(transition);
        let automaton = trans.automaton();
        let previous = self.active[automaton.index()];

        if trans.is_interruptible() && previous != trans.source() {
            return Err(SimulationError::InternalConsistency {
                transition: trans.name().to_string(),
                from_state: model.state(trans.source()).name().to_string(),
                active: model.state(previous).name().to_string(),
                time: self.clock,
            });
        }

        self.active[automaton.index()] = trans.target();
        self.fired += 1;

        trace!(
            time = %self.clock,
            automaton = %model.automaton_path(automaton),
            transition = %trans.name(),
            from = %model.state(previous).name(),
            to = %model.state(trans.target()).name(),
            "Fired transition"
        );

        for &sibling in model.state(previous).outgoing() {
            if sibling != transition && model.transition(sibling).is_interruptible() {
                self.queue.cancel(sibling);
            }
        }

        self.enable_state(trans.target())?;
        self.refresh_guards()
    }

    /// Schedule the outgoing transitions of a newly entered state.
    fn enable_state(&mut self, state: StateId) -> Result<(), SimulationError> {
        let model = Arc::clone(&self.model);
        let enabled: Vec<TransitionId> = model
            .state(state)
            .outgoing()
            .iter()
            .copied()
            .filter(|&t| !self.queue.is_pending(t) && model.transition(t).guard_holds(&*self))
            .collect();

        for transition in enabled {
            self.schedule(transition)?;
        }
        Ok(())
    }

    /// Re-evaluate every guard against the current configuration.
    fn refresh_guards(&mut self) -> Result<(), SimulationError> {
        if !self.has_guards {
            return Ok(());
        }

        let model = Arc::clone(&self.model);
        let mut to_cancel = Vec::new();
        let mut to_schedule = Vec::new();
        for &state in &self.active {
            for &t in model.state(state).outgoing() {
                let trans = model.transition(t);
                if !trans.is_guarded() {
                    continue;
                }
                let holds = trans.guard_holds(&*self);
                let pending = self.queue.is_pending(t);
                if pending && !holds && trans.is_interruptible() {
                    to_cancel.push(t);
                } else if !pending && holds {
                    to_schedule.push(t);
                }
            }
        }

        for t in to_cancel {
            self.interrupt(t);
        }
        for t in to_schedule {
            self.schedule(t)?;
        }
        Ok(())
    }

    fn schedule(&mut self, transition: TransitionId) -> Result<(), SimulationError> {
        let delay = self
            .model
            .transition(transition)
            .law()
            .sample(&mut self.rng)?;
        let time = self.clock + delay;
        self.queue.schedule(transition, time);
        trace!(
            now = %self.clock,
            at = %time,
            transition = %self.model.transition(transition).name(),
            "Scheduled transition"
        );
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// The shared model.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Terminal time.
    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    /// Time of the next pending event, if any.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|(k, _)| k.time)
    }

    /// Scheduled firing time of a pending transition.
    pub fn scheduled_time(&self, transition: TransitionId) -> Option<SimTime> {
        self.queue.scheduled_time(transition)
    }

    /// Number of transitions fired since the start of the replication.
    pub fn fired_count(&self) -> u64 {
        self.fired
    }

    /// Active state of every automaton, indexed by automaton.
    pub fn active_states(&self) -> &[StateId] {
        &self.active
    }

    /// Snapshot of the pending transition firings, in firing order.
    pub fn active_transitions(&self) -> Vec<ActiveTransition> {
        self.queue
            .iter()
            .map(|(key, id)| {
                let trans = self.model.transition(id);
                let automaton = self.model.automaton(trans.automaton());
                ActiveTransition {
                    transition_id: id,
                    component: self.model.component(trans.component()).name().to_string(),
                    automaton: automaton.name().to_string(),
                    transition: trans.name().to_string(),
                    source: self.model.state(trans.source()).name().to_string(),
                    target: self.model.state(trans.target()).name().to_string(),
                    law: trans.declared_law().to_string(),
                    scheduled_time: key.time,
                    interruptible: trans.is_interruptible(),
                }
            })
            .collect()
    }

    /// Initial and current value of every automaton and variable.
    pub fn components_status(&self) -> Vec<ComponentStatus> {
        let mut status = Vec::new();
        for component in self.model.components() {
            for var_id in component.variables() {
                let var = self.model.variable(var_id);
                status.push(ComponentStatus {
                    component: component.name().to_string(),
                    name: var.name().to_string(),
                    kind: StatusKind::Variable,
                    init: var.init().to_string(),
                    current: self.variable(var_id).to_string(),
                });
            }
            for aut_id in component.automata() {
                let automaton = self.model.automaton(aut_id);
                status.push(ComponentStatus {
                    component: component.name().to_string(),
                    name: automaton.name().to_string(),
                    kind: StatusKind::Automaton,
                    init: self.model.state(automaton.init_state()).name().to_string(),
                    current: self.model.state(self.active_state(aut_id)).name().to_string(),
                });
            }
        }
        status
    }
}

impl SystemView for System {
    fn now(&self) -> SimTime {
        self.clock
    }

    fn active_state(&self, automaton: AutomatonId) -> StateId {
        self.active[automaton.index()]
    }

    fn variable(&self, variable: VariableId) -> Value {
        self.model.variable(variable).init()
    }
}
