//! CLI entry point (C13): one positional argument, the scenario file
//! path. Exit 0 on clean termination; a distinct non-zero code for a
//! scenario-load error versus a bad invocation (§6).
//!
//! The surface is exactly one argument, so this hand-rolls the parse
//! with `std::env::args` rather than pulling in `clap`'s derive
//! machinery for a single positional (see DESIGN.md).

use leo_scenario::ScenarioConfig;
use leo_sim::{RunMetrics, Simulation};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EXIT_USAGE: u8 = 2;
const EXIT_SCENARIO_ERROR: u8 = 1;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args();
    let _program = args.next();
    let scenario_path = match args.next() {
        Some(path) if args.next().is_none() => PathBuf::from(path),
        _ => {
            eprintln!("usage: leo-sim <scenario-file>");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let config = match ScenarioConfig::from_file(&scenario_path) {
        Ok(config) => config,
        Err(err) => {
            error!(path = %scenario_path.display(), %err, "scenario load failed");
            return ExitCode::from(EXIT_SCENARIO_ERROR);
        }
    };

    info!(
        satellites = config.satellites.len(),
        ground_stations = config.ground_stations.len(),
        horizon_s = config.sim_time_limit_s,
        seed = config.seed,
        "scenario loaded"
    );

    let mut sim = match Simulation::from_scenario(&config) {
        Ok(sim) => sim,
        Err(err) => {
            error!(path = %scenario_path.display(), %err, "scenario validation failed");
            return ExitCode::from(EXIT_SCENARIO_ERROR);
        }
    };
    sim.run();

    let run_metrics = RunMetrics::from_simulation(&sim);
    info!("simulation finished");
    println!("{run_metrics}");
    match run_metrics.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => error!(%err, "failed to serialize run metrics to JSON"),
    }

    ExitCode::SUCCESS
}
