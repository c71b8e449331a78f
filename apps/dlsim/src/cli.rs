//! Command line interface definition

use clap::Parser;
use dlsim_types::{ColorChoice, Mode};
use std::path::PathBuf;

/// dlsim - Deadlock avoidance and detection simulator
#[derive(Parser, Debug)]
#[command(name = "dlsim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadlock avoidance and detection simulator")]
#[command(long_about = None)]
pub struct Cli {
    /// Deadlock handling policy
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Comma-separated unit totals per resource type, e.g. 3,3,2
    #[arg(long, value_name = "LIST")]
    pub resources: Option<String>,

    /// Number of simulated processes
    #[arg(long = "n", value_name = "COUNT")]
    pub processes: Option<usize>,

    /// Seed for the scenario and every agent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Detector polling interval
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Force-abort whatever is still running after this long
    #[arg(long, value_name = "MS")]
    pub run_timeout_ms: Option<u64>,

    /// Run on real time with the multi-threaded runtime
    #[arg(long)]
    pub wall_clock: bool,

    /// Print the final report as JSON and nothing else
    #[arg(long)]
    pub json: bool,

    /// Write structured JSON logs to the log directory
    #[arg(long)]
    pub debug: bool,

    /// Color output control
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_parse() {
        let cli = Cli::try_parse_from([
            "dlsim",
            "--mode",
            "detection",
            "--resources",
            "2,2",
            "--n",
            "4",
            "--seed",
            "9",
            "--wall-clock",
        ])
        .unwrap();
        assert_eq!(cli.mode, Some(Mode::Detection));
        assert_eq!(cli.resources.as_deref(), Some("2,2"));
        assert_eq!(cli.processes, Some(4));
        assert_eq!(cli.seed, Some(9));
        assert!(cli.wall_clock);
        assert!(!cli.json);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["dlsim", "--mode", "optimistic"]).is_err());
    }
}
