//! # CME MDP 3.0 Capture Microstructure Analyzer
//!
//! An offline analyzer for CME Market Data Platform (MDP 3.0) captures. It
//! reads an ERF capture of UDP-encapsulated MDP messages, reconstructs
//! per-instrument limit order books from incremental book refreshes,
//! correlates them with trade summaries, and reports three families of
//! inferred microstructure events as CSV:
//!
//! - **Sweeps**: aggressive trade runs crossing multiple price levels,
//!   accumulated per instrument between trade boundaries.
//! - **Icebergs**: hidden-liquidity orders detected by the replenishment
//!   signature, where a fully consumed level reappears at the same price
//!   in the next book snapshot.
//! - **Stops**: stop-order chains derived from the order list attached to
//!   each trade summary, correlating order ids and fill quantities.
//!
//! ## Pipeline
//!
//! Processing is a single-threaded fold over the capture file:
//!
//! ```text
//! ERF reader -> frame strip -> dispatcher -> per-instrument books and
//! detectors -> CSV reports at indicator boundaries and end of run
//! ```
//!
//! Every refresh message carries an indicator byte. The dispatcher acts on
//! three of its bits after applying each message: the trade boundary
//! closes sweep runs and stop chains, the quote boundary runs the iceberg
//! check against the refreshed books, and the message boundary clears the
//! packet's dirty set.
//!
//! ## Usage
//!
//! ```no_run
//! use mdp_sleuth::{RunConfig, run};
//!
//! let config = RunConfig::new("capture.erf", "sweeps.csv", "icebergs.csv", "stops.csv");
//! let stats = run(&config)?;
//! println!("{} packets, {} sweeps", stats.packets, stats.sweeps);
//! # Ok::<(), mdp_sleuth::AnalyzerError>(())
//! ```
//!
//! The symbol file (`cme_ids.txt` by default) maps security ids to
//! symbols, price shifts, and tick sizes; ids missing from it are skipped.

pub mod book;
pub mod detector;
pub mod engine;
pub mod feed;
pub mod prelude;
pub mod report;
mod utils;

use std::path::{Path, PathBuf};

use tracing::info;

pub use book::{BookSide, InstrumentBook, Level, MAX_LEVELS, SideKind};
pub use detector::{
    Aggressor, Iceberg, IcebergTracker, StopsChain, StopsTracker, StopsTrade, SweepEvent,
    SweepTracker,
};
pub use engine::{
    AnalyzerError, Dispatcher, RunStats, SecurityRegistry, SecurityState, UnknownSecurity,
};
pub use feed::{ErfReader, ErfRecord, FeedError, Indicator};
pub use report::Reports;
pub use utils::format_ns_timestamp;

/// Default symbol file name, resolved against the working directory.
pub const DEFAULT_SYMBOL_FILE: &str = "cme_ids.txt";

/// Everything a run needs: the capture, the three report paths, the
/// symbol file, and the sweep threshold.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// ERF capture file to analyze.
    pub capture: PathBuf,
    /// Output path for the sweeps report.
    pub sweeps: PathBuf,
    /// Output path for the icebergs report.
    pub icebergs: PathBuf,
    /// Output path for the stops report.
    pub stops: PathBuf,
    /// Symbol file path.
    pub symbols: PathBuf,
    /// Minimum clean-price distance for sweep emission.
    pub min_sweep_depth: i64,
}

impl RunConfig {
    /// Configure a run with the default symbol file and sweep threshold.
    pub fn new(
        capture: impl AsRef<Path>,
        sweeps: impl AsRef<Path>,
        icebergs: impl AsRef<Path>,
        stops: impl AsRef<Path>,
    ) -> Self {
        Self {
            capture: capture.as_ref().to_path_buf(),
            sweeps: sweeps.as_ref().to_path_buf(),
            icebergs: icebergs.as_ref().to_path_buf(),
            stops: stops.as_ref().to_path_buf(),
            symbols: PathBuf::from(DEFAULT_SYMBOL_FILE),
            min_sweep_depth: 0,
        }
    }
}

/// Run the full analysis: load symbols, fold the capture through the
/// dispatcher, and write the three reports.
pub fn run(config: &RunConfig) -> Result<RunStats, AnalyzerError> {
    let registry = SecurityRegistry::from_symbol_file(&config.symbols, config.min_sweep_depth)?;
    let reports = Reports::create(&config.sweeps, &config.icebergs, &config.stops)?;
    let mut dispatcher = Dispatcher::new(registry, reports);

    for record in ErfReader::open(&config.capture)? {
        let record = record?;
        // The first two payload bytes are link padding.
        let frame = record.payload.get(2..).unwrap_or_default();
        dispatcher.process_packet(record.ts, frame)?;
    }

    let (stats, reports) = dispatcher.finish()?;
    reports.finish()?;
    info!(
        packets = stats.packets,
        messages = stats.messages,
        sweeps = stats.sweeps,
        icebergs = stats.icebergs,
        stops = stats.stops,
        "run complete"
    );
    Ok(stats)
}
