//! The four-sided per-instrument book.

use super::side::BookSide;

/// All book state for one instrument: outright and implied levels on both
/// sides. Detectors only consult the outright sides; the implied sides are
/// maintained for data-model fidelity with the feed.
#[derive(Debug, Clone, Default)]
pub struct InstrumentBook {
    /// Outright bid levels, best (highest) first.
    pub bids: BookSide,
    /// Outright ask levels, best (lowest) first.
    pub asks: BookSide,
    /// Implied bid levels synthesized by the exchange.
    pub implied_bids: BookSide,
    /// Implied ask levels synthesized by the exchange.
    pub implied_asks: BookSide,
}

impl InstrumentBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }
}
