//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mdp_sleuth::{DEFAULT_SYMBOL_FILE, RunConfig, run};

/// Analyze a CME MDP 3.0 capture for sweeps, icebergs, and stop chains.
#[derive(Debug, Parser)]
#[command(name = "mdp-sleuth", version, about)]
struct Cli {
    /// ERF capture file to analyze.
    capture: PathBuf,
    /// Output path for the sweeps CSV.
    sweeps: PathBuf,
    /// Output path for the icebergs CSV.
    icebergs: PathBuf,
    /// Output path for the stops CSV.
    stops: PathBuf,

    /// Symbol file mapping security ids to symbols.
    #[arg(long, default_value = DEFAULT_SYMBOL_FILE)]
    symbols: PathBuf,

    /// Minimum clean-price distance a sweep must cross to be reported.
    #[arg(long, default_value_t = 0)]
    min_sweep_depth: i64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RunConfig {
        capture: cli.capture,
        sweeps: cli.sweeps,
        icebergs: cli.icebergs,
        stops: cli.stops,
        symbols: cli.symbols,
        min_sweep_depth: cli.min_sweep_depth,
    };

    match run(&config) {
        Ok(stats) => {
            info!(
                sweeps = stats.sweeps,
                icebergs = stats.icebergs,
                stops = stats.stops,
                "reports written"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("mdp-sleuth: {err}");
            ExitCode::FAILURE
        }
    }
}
