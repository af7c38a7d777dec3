//! Simulator entry point: CLI wiring, logging setup and config-driven runs.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hybrid_dc_sim::analysis::{default_distances, distance_sweep};
use hybrid_dc_sim::config::SimulationConfig;
use hybrid_dc_sim::io::export::{RunResults, export_csv, export_json};
use hybrid_dc_sim::sim::engine::Engine;

use cli::Args;

fn init_tracing(quiet: bool) {
    let fallback = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the scenario: `--scenario` takes priority, then `--preset`, then baseline.
fn load_scenario(args: &Args) -> Result<SimulationConfig> {
    let mut scenario = if let Some(path) = &args.scenario {
        SimulationConfig::from_toml_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?
    } else if let Some(name) = &args.preset {
        SimulationConfig::from_preset(name)?
    } else {
        SimulationConfig::baseline()
    };

    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }
    Ok(scenario)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    let scenario = load_scenario(&args)?;

    if args.distance_sweep {
        println!("{}\n", distance_sweep(&scenario, &default_distances())?);
    }

    let mut engine = Engine::from_scenario(&scenario)?;
    let records = engine.run()?;
    let summary = engine.summary();

    if !args.quiet {
        for r in &records {
            println!("{r}");
        }
        println!();
    }
    println!("{summary}");

    if let Some(path) = &args.telemetry_out {
        export_csv(&records, path)
            .with_context(|| format!("writing telemetry to {}", path.display()))?;
        info!(path = %path.display(), "telemetry written");
    }

    if let Some(path) = &args.results_out {
        let results = RunResults {
            config: &scenario,
            summary: &summary,
            steps: &records,
        };
        export_json(&results, path)
            .with_context(|| format!("writing results to {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }

    Ok(())
}
