//! Canned system specifications for tests.
//!
//! Each fixture is small enough to trace by hand; the doc comment of each
//! one spells out the expected timeline where it matters.

use relia_types::{
    AutomatonSpec, ComponentSpec, Distribution, Param, SystemSpec, TransitionSpec, VariableSpec,
};

/// A pump that fails at rate `Pump.lambda` and is repaired in 24, plus a
/// valve that opens after 5 and closes after 10 forever.
pub fn pump_system() -> SystemSpec {
    SystemSpec::new("plant")
        .with_component(
            ComponentSpec::new("Pump")
                .with_variable(VariableSpec::new("lambda", 0.001))
                .with_variable(VariableSpec::new("spare", true))
                .with_automaton(
                    AutomatonSpec::new("health", ["ok", "failed"])
                        .with_transition(TransitionSpec::new(
                            "fail",
                            "ok",
                            "failed",
                            Distribution::exponential(Param::variable("Pump", "lambda")),
                        ))
                        .with_transition(
                            TransitionSpec::new("repair", "failed", "ok", Distribution::delay(24.0))
                                .with_interruptible(false),
                        ),
                ),
        )
        .with_component(
            ComponentSpec::new("Valve").with_automaton(
                AutomatonSpec::new("position", ["open", "closed"])
                    .with_init_state("closed")
                    .with_transition(TransitionSpec::new(
                        "open",
                        "closed",
                        "open",
                        Distribution::delay(5.0),
                    ))
                    .with_transition(TransitionSpec::new(
                        "close",
                        "open",
                        "closed",
                        Distribution::delay(10.0),
                    )),
            ),
        )
}

/// Single automaton `A -> B` under `exp(rate)`, no competing transitions.
pub fn exponential_system(rate: f64) -> SystemSpec {
    SystemSpec::new("exp").with_component(
        ComponentSpec::new("C").with_automaton(
            AutomatonSpec::new("a", ["A", "B"]).with_transition(TransitionSpec::new(
                "go",
                "A",
                "B",
                Distribution::exponential(rate),
            )),
        ),
    )
}

/// Two transitions racing out of `A`:
///
/// - `slow`: `A -> B`, interruptible, `delay(10)`
/// - `fast`: `A -> C`, non-interruptible, `delay(1)`
///
/// `fast` fires at 1 and cancels `slow`; the automaton stays in `C`.
pub fn race_system() -> SystemSpec {
    SystemSpec::new("race").with_component(
        ComponentSpec::new("C").with_automaton(
            AutomatonSpec::new("a", ["A", "B", "C"])
                .with_transition(TransitionSpec::new(
                    "slow",
                    "A",
                    "B",
                    Distribution::delay(10.0),
                ))
                .with_transition(
                    TransitionSpec::new("fast", "A", "C", Distribution::delay(1.0))
                        .with_interruptible(false),
                ),
        ),
    )
}

/// A non-interruptible `watchdog: A -> D` at `delay(5)` while the automaton
/// bounces `A -> B` (`leave`, after `leave`) and `B -> A` (`back`, after
/// `back`).
///
/// With `leave = back = 1` the automaton is back in `A` at 2 and 4; the
/// watchdog keeps its original timer and fires at exactly 5.
pub fn reentry_system(leave: f64, back: f64) -> SystemSpec {
    SystemSpec::new("reentry").with_component(
        ComponentSpec::new("C").with_automaton(
            AutomatonSpec::new("a", ["A", "B", "D"])
                .with_transition(
                    TransitionSpec::new("watchdog", "A", "D", Distribution::delay(5.0))
                        .with_interruptible(false),
                )
                .with_transition(TransitionSpec::new(
                    "leave",
                    "A",
                    "B",
                    Distribution::delay(leave),
                ))
                .with_transition(TransitionSpec::new(
                    "back",
                    "B",
                    "A",
                    Distribution::delay(back),
                )),
        ),
    )
}

/// An automaton cycling `on -> off` after 2 and `off -> on` after 3.
pub fn cycle_system() -> SystemSpec {
    SystemSpec::new("cycle").with_component(
        ComponentSpec::new("Lamp").with_automaton(
            AutomatonSpec::new("power", ["on", "off"])
                .with_transition(TransitionSpec::new(
                    "switch_off",
                    "on",
                    "off",
                    Distribution::delay(2.0),
                ))
                .with_transition(TransitionSpec::new(
                    "switch_on",
                    "off",
                    "on",
                    Distribution::delay(3.0),
                )),
        ),
    )
}

/// A repairable pump (`fail` at `exp(0.1)`, `repair` after 2) next to a
/// repair crew that is `busy` until 10 and `available` afterwards.
///
/// Tests attach a guard on `Pump.health.repair` requiring the crew to be
/// available.
pub fn crew_system() -> SystemSpec {
    SystemSpec::new("crew")
        .with_component(
            ComponentSpec::new("Pump").with_automaton(
                AutomatonSpec::new("health", ["ok", "failed"])
                    .with_init_state("failed")
                    .with_transition(TransitionSpec::new(
                        "fail",
                        "ok",
                        "failed",
                        Distribution::exponential(0.1),
                    ))
                    .with_transition(TransitionSpec::new(
                        "repair",
                        "failed",
                        "ok",
                        Distribution::delay(2.0),
                    )),
            ),
        )
        .with_component(
            ComponentSpec::new("Crew").with_automaton(
                AutomatonSpec::new("status", ["busy", "available"]).with_transition(
                    TransitionSpec::new("free", "busy", "available", Distribution::delay(10.0)),
                ),
            ),
        )
}

/// A `Switch.pos` that flips from `on` to `off` at 1, next to a
/// `Task.step` whose `go` (`x` to `y`, after 5) has the given
/// interruptibility.
///
/// Tests attach a guard on `Task.step.go` requiring the switch to be on.
pub fn interlock_system(interruptible: bool) -> SystemSpec {
    SystemSpec::new("interlock")
        .with_component(
            ComponentSpec::new("Switch").with_automaton(
                AutomatonSpec::new("pos", ["on", "off"]).with_transition(TransitionSpec::new(
                    "flip",
                    "on",
                    "off",
                    Distribution::delay(1.0),
                )),
            ),
        )
        .with_component(
            ComponentSpec::new("Task").with_automaton(
                AutomatonSpec::new("step", ["x", "y"]).with_transition(
                    TransitionSpec::new("go", "x", "y", Distribution::delay(5.0))
                        .with_interruptible(interruptible),
                ),
            ),
        )
}

/// A single state `a` with a `tick` self-loop every 1, an interruptible
/// `fail` to `b` after 3 and a non-interruptible `wear` to `b` after 2.5.
pub fn self_loop_system() -> SystemSpec {
    SystemSpec::new("self-loop").with_component(
        ComponentSpec::new("C").with_automaton(
            AutomatonSpec::new("a", ["a", "b"])
                .with_transition(TransitionSpec::new("tick", "a", "a", Distribution::delay(1.0)))
                .with_transition(TransitionSpec::new("fail", "a", "b", Distribution::delay(3.0)))
                .with_transition(
                    TransitionSpec::new("wear", "a", "b", Distribution::delay(2.5))
                        .with_interruptible(false),
                ),
        ),
    )
}
