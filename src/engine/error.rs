//! Run-level error taxonomy.
//!
//! Configuration and I/O failures abort the run with one of these; frame
//! and message malformations are swallowed on the hot path and only
//! counted.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::feed::FeedError;

/// Errors that abort an analysis run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyzerError {
    /// The symbol file could not be read at startup.
    #[error("symbol file {path}: {source}")]
    SymbolFile {
        /// Symbol file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The capture file could not be opened or read.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Writing one of the CSV reports failed.
    #[error("writing {report} report: {source}")]
    Report {
        /// Which report was being written.
        report: &'static str,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Creating or flushing a report file failed.
    #[error("report output: {0}")]
    ReportIo(#[from] io::Error),
}

impl AnalyzerError {
    /// Attach the report name to a CSV error.
    pub(crate) fn report(report: &'static str) -> impl FnOnce(csv::Error) -> Self {
        move |source| AnalyzerError::Report { report, source }
    }
}
