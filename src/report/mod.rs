//! CSV report output: one writer per event family, append-only streams
//! held open for the lifetime of the run.

mod writers;

pub use writers::{IcebergRecord, Reports, StopsRecord, SweepRecord};
