//! The three CSV writers and their record shapes.
//!
//! Headers are written eagerly so an empty report still carries its header
//! row. Records serialize through serde with field order matching the
//! documented columns.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::engine::AnalyzerError;

const SWEEPS_HEADERS: [&str; 6] = [
    "ts",
    "symbol",
    "start_price",
    "end_price",
    "total_traded",
    "aggr_side",
];
const ICEBERGS_HEADERS: [&str; 6] = ["ts", "symbol", "price", "show_size", "traded_size", "side"];
const STOPS_HEADERS: [&str; 8] = [
    "ts",
    "exchange_ts",
    "symbol",
    "order_id",
    "trigger_price",
    "order_size",
    "traded_size",
    "side",
];

/// One sweep row. Prices are clean units; `aggr_side` is 1 for buy runs.
#[derive(Debug, Serialize)]
pub struct SweepRecord<'a> {
    /// Formatted capture timestamp of the first trade.
    pub ts: String,
    /// Instrument symbol.
    pub symbol: &'a str,
    /// Clean price of the first trade.
    pub start_price: i64,
    /// Clean price of the last trade.
    pub end_price: i64,
    /// Total quantity across the run.
    pub total_traded: i64,
    /// 1 when the buyer was the aggressor, else 0.
    pub aggr_side: u8,
}

/// One iceberg row.
#[derive(Debug, Serialize)]
pub struct IcebergRecord<'a> {
    /// Formatted capture timestamp of the first replenishment.
    pub ts: String,
    /// Instrument symbol.
    pub symbol: &'a str,
    /// Clean price of the replenishing level.
    pub price: i64,
    /// Smallest displayed quantity observed.
    pub show_size: i32,
    /// Total quantity inferred traded through the level.
    pub traded_size: i32,
    /// `B` for bid-side icebergs, `S` for ask-side.
    pub side: char,
}

/// One stop-chain row (the aggressor entry is never written).
#[derive(Debug, Serialize)]
pub struct StopsRecord<'a> {
    /// Formatted capture timestamp of the chain.
    pub ts: String,
    /// Formatted exchange transact time of the stop's fill.
    pub exchange_ts: String,
    /// Instrument symbol.
    pub symbol: &'a str,
    /// Wire order id of the stop.
    pub order_id: u64,
    /// Clean price of the trade that started the event.
    pub trigger_price: i64,
    /// Fill quantity plus replenished size.
    pub order_size: u32,
    /// Fill quantity.
    pub traded_size: u32,
    /// `B` for buy stops, `S` for sell stops.
    pub side: char,
}

/// The three report streams.
pub struct Reports<W: Write> {
    sweeps: csv::Writer<W>,
    icebergs: csv::Writer<W>,
    stops: csv::Writer<W>,
}

impl Reports<File> {
    /// Create the three report files, truncating any existing contents.
    pub fn create(
        sweeps: impl AsRef<Path>,
        icebergs: impl AsRef<Path>,
        stops: impl AsRef<Path>,
    ) -> Result<Self, AnalyzerError> {
        Self::new(
            File::create(sweeps)?,
            File::create(icebergs)?,
            File::create(stops)?,
        )
    }
}

impl<W: Write> Reports<W> {
    /// Wrap three output streams and write the header rows.
    pub fn new(sweeps: W, icebergs: W, stops: W) -> Result<Self, AnalyzerError> {
        let mut reports = Self {
            sweeps: Self::writer(sweeps),
            icebergs: Self::writer(icebergs),
            stops: Self::writer(stops),
        };
        reports
            .sweeps
            .write_record(SWEEPS_HEADERS)
            .map_err(AnalyzerError::report("sweeps"))?;
        reports
            .icebergs
            .write_record(ICEBERGS_HEADERS)
            .map_err(AnalyzerError::report("icebergs"))?;
        reports
            .stops
            .write_record(STOPS_HEADERS)
            .map_err(AnalyzerError::report("stops"))?;
        Ok(reports)
    }

    fn writer(inner: W) -> csv::Writer<W> {
        // Headers are written explicitly above so empty reports keep them.
        csv::WriterBuilder::new().has_headers(false).from_writer(inner)
    }

    /// Append one sweep row.
    pub fn write_sweep(&mut self, record: &SweepRecord<'_>) -> Result<(), AnalyzerError> {
        self.sweeps
            .serialize(record)
            .map_err(AnalyzerError::report("sweeps"))
    }

    /// Append one iceberg row.
    pub fn write_iceberg(&mut self, record: &IcebergRecord<'_>) -> Result<(), AnalyzerError> {
        self.icebergs
            .serialize(record)
            .map_err(AnalyzerError::report("icebergs"))
    }

    /// Append one stop row.
    pub fn write_stop(&mut self, record: &StopsRecord<'_>) -> Result<(), AnalyzerError> {
        self.stops
            .serialize(record)
            .map_err(AnalyzerError::report("stops"))
    }

    /// Flush all three streams.
    pub fn finish(mut self) -> Result<(), AnalyzerError> {
        self.sweeps.flush()?;
        self.icebergs.flush()?;
        self.stops.flush()?;
        Ok(())
    }

    /// Flush and return the inner streams, for callers that own buffers.
    pub fn into_writers(self) -> Result<(W, W, W), AnalyzerError> {
        let unwrap = |writer: csv::Writer<W>| {
            writer
                .into_inner()
                .map_err(|err| AnalyzerError::ReportIo(err.into_error()))
        };
        Ok((
            unwrap(self.sweeps)?,
            unwrap(self.icebergs)?,
            unwrap(self.stops)?,
        ))
    }
}
