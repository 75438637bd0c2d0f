//! The three microstructure detectors driven by trade summaries and book
//! refreshes: iceberg replenishment, sweep runs, and stop-order chains.
//!
//! Each detector is per-instrument state mutated by the dispatcher as
//! messages arrive, with batch boundaries signalled by the indicator bits
//! of the feed (last trade, last quote, last message of packet).

mod iceberg;
mod stops;
mod sweep;

pub use iceberg::{Iceberg, IcebergTracker};
pub use stops::{StopsChain, StopsTracker, StopsTrade};
pub use sweep::{SweepEvent, SweepTracker};

/// Aggressor side of a trade as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggressor {
    /// No aggressor: implied trade or unknown initiator.
    None,
    /// The buyer crossed the spread.
    Buy,
    /// The seller crossed the spread.
    Sell,
    /// Unrecognized wire value.
    Other(u8),
}

impl Aggressor {
    /// Decode the wire byte (0 none, 1 buy, 2 sell).
    #[inline]
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Aggressor::None,
            1 => Aggressor::Buy,
            2 => Aggressor::Sell,
            other => Aggressor::Other(other),
        }
    }
}
