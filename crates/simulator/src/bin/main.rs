//! Relia Simulator CLI
//!
//! Runs Monte Carlo studies described in TOML study files.

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use relia_simulation::System;
use relia_simulator::{MonteCarloRunner, SimulatorConfig, StudyFile};
use relia_types::SimTime;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relia-sim")]
#[command(about = "Monte Carlo simulator for stochastic automata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a study and print the indicator estimates
    Run {
        /// Study file
        study: PathBuf,

        /// Override the number of replications
        #[arg(long)]
        runs: Option<usize>,

        /// Override the base seed
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (default: one per core)
        #[arg(long)]
        threads: Option<usize>,

        /// Replications per work unit
        #[arg(long, default_value = "64")]
        chunk_size: usize,

        /// Wall-clock budget (e.g., "30s", "5m")
        #[arg(long)]
        deadline: Option<humantime::Duration>,
    },

    /// Validate a study without running it
    Check {
        /// Study file
        study: PathBuf,
    },

    /// Run a single replication and show the pending transitions
    Inspect {
        /// Study file
        study: PathBuf,

        /// Simulated time to run to
        #[arg(long, default_value = "0")]
        until: f64,

        /// Seed of the replication
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            study,
            runs,
            seed,
            threads,
            chunk_size,
            deadline,
        } => {
            let mut file = StudyFile::load(&study)?;
            if let Some(runs) = runs {
                file.simulation.nb_runs = runs;
            }
            if let Some(seed) = seed {
                file.simulation.seed = Some(seed);
            }
            let study = file.build()?;

            let mut config = SimulatorConfig::new().with_chunk_size(chunk_size);
            if let Some(threads) = threads {
                config = config.with_threads(threads);
            }
            if let Some(deadline) = deadline {
                config = config.with_deadline(*deadline);
            }

            let runner = MonteCarloRunner::new(study.engine, study.params)?.with_config(config);
            let report = runner.run()?;
            report.print();
        }

        Commands::Check { study } => {
            let study = StudyFile::load(&study)?.build()?;
            let instants = study.params.instants()?;
            println!(
                "{}: {} components, {} automata, {} transitions, {} indicators, {} instants",
                study.model.name(),
                study.model.components().len(),
                study.model.automata().len(),
                study.model.transitions().len(),
                study.engine.len(),
                instants.len()
            );
        }

        Commands::Inspect { study, until, seed } => {
            let study = StudyFile::load(&study)?.build()?;
            let mut system = System::new(Arc::clone(&study.model), ChaCha8Rng::seed_from_u64(seed))?
                .with_horizon(study.params.t_max()?);
            let fired = system.run_to(SimTime::new(until))?;

            println!("\n=== {} after {} firings ===", study.model.name(), fired);
            println!("\nActive transitions:");
            println!(
                "{:<16} {:<20} {:<12} {:<12} {:<20} {:>12}",
                "component", "transition", "source", "target", "law", "planned"
            );
            for t in system.active_transitions() {
                println!(
                    "{:<16} {:<20} {:<12} {:<12} {:<20} {:>12}",
                    t.component,
                    t.transition,
                    t.source,
                    t.target,
                    t.law,
                    t.scheduled_time.to_string()
                );
            }

            println!("\nComponents status:");
            println!(
                "{:<16} {:<20} {:<5} {:<12} {:<12}",
                "component", "name", "type", "init", "current"
            );
            for s in system.components_status() {
                println!(
                    "{:<16} {:<20} {:<5} {:<12} {:<12}",
                    s.component,
                    s.name,
                    s.kind.to_string(),
                    s.init,
                    s.current
                );
            }
        }
    }

    Ok(())
}
