use std::path::PathBuf;

use clap::Parser;

/// Hybrid data-center power dispatch simulator.
///
/// Scenario selection: `--scenario` takes priority, then `--preset`, then the
/// baseline preset.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Load the scenario from a TOML file.
    #[clap(long)]
    pub scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, wind_only, solar_heavy).
    #[clap(long, conflicts_with = "scenario")]
    pub preset: Option<String>,

    /// Override the random seed.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Export per-step records to CSV.
    #[clap(long = "telemetry-out")]
    pub telemetry_out: Option<PathBuf>,

    /// Export the configuration, summary and step records to JSON.
    #[clap(long = "results-out")]
    pub results_out: Option<PathBuf>,

    /// Print transmission loss against distance for the scenario's wind farm.
    #[clap(long = "distance-sweep")]
    pub distance_sweep: bool,

    /// Print only the run summary and log warnings only.
    #[clap(long, short)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["hybrid-dc-sim"]).expect("no flags should parse");
        assert!(args.scenario.is_none());
        assert!(args.preset.is_none());
        assert!(!args.distance_sweep);
        assert!(!args.quiet);
    }

    #[test]
    fn all_flags() {
        let args = Args::try_parse_from([
            "hybrid-dc-sim",
            "--preset",
            "solar_heavy",
            "--seed",
            "7",
            "--telemetry-out",
            "steps.csv",
            "--results-out",
            "run.json",
            "--distance-sweep",
            "--quiet",
        ])
        .expect("flags should parse");
        assert_eq!(args.preset.as_deref(), Some("solar_heavy"));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.telemetry_out, Some(PathBuf::from("steps.csv")));
        assert_eq!(args.results_out, Some(PathBuf::from("run.json")));
        assert!(args.distance_sweep && args.quiet);
    }

    #[test]
    fn scenario_and_preset_conflict() {
        let parsed = Args::try_parse_from([
            "hybrid-dc-sim",
            "--scenario",
            "a.toml",
            "--preset",
            "baseline",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn seed_must_be_unsigned() {
        assert!(Args::try_parse_from(["hybrid-dc-sim", "--seed", "-3"]).is_err());
    }
}
