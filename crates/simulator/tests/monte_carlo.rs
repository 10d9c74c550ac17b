//! End-to-end properties of Monte Carlo studies.

use relia_indicators::{Indicator, IndicatorEngine, Measure, Observable, Stat};
use relia_model::Model;
use relia_simulator::{
    MonteCarloRunner, RunnerError, SimulationParams, SimulationReport, SimulatorConfig,
};
use relia_test_helpers::{
    cycle_system, exponential_system, pump_system, race_system, reentry_system,
};
use relia_types::{ParameterError, SystemSpec};
use std::sync::Arc;
use tracing_test::traced_test;

fn run(
    spec: &SystemSpec,
    indicators: Vec<Indicator>,
    params: SimulationParams,
    config: SimulatorConfig,
) -> Result<SimulationReport, RunnerError> {
    let mut engine = IndicatorEngine::new(Arc::new(Model::from_spec(spec)?));
    for indicator in indicators {
        engine.register(indicator)?;
    }
    MonteCarloRunner::new(engine, params)?
        .with_config(config)
        .run()
}

fn column(report: &SimulationReport, name: &str, stat: Stat) -> Vec<f64> {
    report
        .indicator(name)
        .and_then(|r| r.column(stat))
        .unwrap()
        .iter()
        .map(|v| v.unwrap())
        .collect()
}

#[traced_test]
#[test]
fn exponential_sojourn_mean_matches_rate() {
    let report = run(
        &exponential_system(0.5),
        vec![Indicator::new("in_a", Observable::state("C", "a", "A"))
            .with_measure(Measure::SojournTime)],
        SimulationParams::new(20_000).with_seed(2024).with_instant(100.0),
        SimulatorConfig::new(),
    )
    .unwrap();

    assert_eq!(report.completed, 20_000);
    let mean = column(&report, "in_a", Stat::Mean)[0];
    assert!((mean - 2.0).abs() < 0.1, "mean sojourn {} not within 5% of 2", mean);
}

#[test]
fn delay_only_model_has_no_spread() {
    let report = run(
        &cycle_system(),
        vec![
            Indicator::new("on", Observable::state("Lamp", "power", "on"))
                .with_stats([Stat::Mean, Stat::StdDev]),
            Indicator::new("on_time", Observable::state("Lamp", "power", "on"))
                .with_measure(Measure::SojournTime)
                .with_stats([Stat::Mean, Stat::StdDev]),
        ],
        SimulationParams::new(50).with_seed(5).with_range(0.0, 30.0, 31),
        SimulatorConfig::new().with_chunk_size(7),
    )
    .unwrap();

    for name in ["on", "on_time"] {
        assert!(column(&report, name, Stat::StdDev).iter().all(|&s| s == 0.0));
    }
    // on during [0, 2), [5, 7), ... : 2 out of every 5.
    assert_eq!(column(&report, "on_time", Stat::Mean)[30], 12.0);
}

#[test]
fn faster_non_interruptible_sibling_cancels_slow_path() {
    let report = run(
        &race_system(),
        vec![
            Indicator::new("b", Observable::state("C", "a", "B")).with_measure(Measure::HadValue),
            Indicator::new("c", Observable::state("C", "a", "C")),
        ],
        SimulationParams::new(20).with_seed(1).with_instant(20.0),
        SimulatorConfig::new(),
    )
    .unwrap();

    assert_eq!(column(&report, "b", Stat::Mean), vec![0.0]);
    assert_eq!(column(&report, "c", Stat::Mean), vec![1.0]);
}

#[test]
fn non_interruptible_timer_survives_reentry() {
    let report = run(
        &reentry_system(1.0, 1.0),
        vec![Indicator::new("done", Observable::state("C", "a", "D"))
            .with_measure(Measure::HadValue)],
        SimulationParams::new(3)
            .with_seed(1)
            .with_instant(4.9)
            .with_instant(5.0)
            .with_instant(6.0),
        SimulatorConfig::new(),
    )
    .unwrap();

    assert_eq!(column(&report, "done", Stat::Mean), vec![0.0, 1.0, 1.0]);
}

#[test]
fn cumulative_measures_are_monotone_in_time() {
    let target = || Observable::state("Pump", "health", "failed");
    let spec = {
        // A faster-failing pump so that failures actually happen.
        let mut spec = pump_system();
        spec.components[0].variables[0].init = 0.05.into();
        spec
    };
    let report = run(
        &spec,
        vec![
            Indicator::new("down_time", target()).with_measure(Measure::SojournTime),
            Indicator::new("failures", target()).with_measure(Measure::NbOccurrences),
            Indicator::new("ever_failed", target()).with_measure(Measure::HadValue),
        ],
        SimulationParams::new(300).with_seed(77).with_range(0.0, 500.0, 26),
        SimulatorConfig::new(),
    )
    .unwrap();

    for name in ["down_time", "failures", "ever_failed"] {
        let values = column(&report, name, Stat::Mean);
        assert!(
            values.windows(2).all(|w| w[0] <= w[1]),
            "{} is not monotone: {:?}",
            name,
            values
        );
    }
    let ever = column(&report, "ever_failed", Stat::Mean);
    assert!(ever.iter().all(|&p| (0.0..=1.0).contains(&p)));
    assert!(*ever.last().unwrap() > 0.9);
}

#[test]
fn fixed_seed_is_reproducible_across_thread_counts() {
    let study = |threads: usize| {
        run(
            &pump_system(),
            vec![
                Indicator::new("down", Observable::state("Pump", "health", "failed"))
                    .with_measure(Measure::SojournTime)
                    .with_stats([Stat::Mean, Stat::StdDev]),
                Indicator::new("open", Observable::state("Valve", "position", "open")),
            ],
            SimulationParams::new(500)
                .with_seed(31337)
                .with_range(0.0, 2000.0, 9),
            SimulatorConfig::new().with_threads(threads).with_chunk_size(32),
        )
        .unwrap()
        .rows()
    };

    let single = study(1);
    assert_eq!(single, study(1));
    assert_eq!(single, study(3));
    assert_eq!(single, study(8));
}

#[test]
fn different_seeds_differ() {
    let study = |seed: u64| {
        let report = run(
            &exponential_system(0.5),
            vec![Indicator::new("in_a", Observable::state("C", "a", "A"))
                .with_measure(Measure::SojournTime)],
            SimulationParams::new(100).with_seed(seed).with_instant(10.0),
            SimulatorConfig::new(),
        )
        .unwrap();
        column(&report, "in_a", Stat::Mean)[0]
    };
    assert_ne!(study(1), study(2));
}

#[test]
fn model_round_trips_without_running() {
    for spec in [pump_system(), race_system(), cycle_system()] {
        let model = Model::from_spec(&spec).unwrap();
        assert_eq!(model.to_spec(), spec);
    }

    let err = run(
        &pump_system(),
        vec![Indicator::new("down", Observable::state("Pump", "health", "failed"))],
        SimulationParams::new(0).with_instant(1.0),
        SimulatorConfig::new(),
    )
    .unwrap_err();
    assert!(matches!(err, RunnerError::Parameter(ParameterError::NbRuns(0))));
}
