//! Per-instrument analysis state: the book, the packet-scoped flags, and
//! the three detectors.

use crate::book::{InstrumentBook, SideKind};
use crate::detector::{IcebergTracker, StopsTracker, SweepTracker};

/// Everything the analyzer tracks for one security id.
#[derive(Debug)]
pub struct SecurityState {
    /// Human-readable symbol from the symbol file.
    pub symbol: String,
    /// Exchange security id.
    pub sec_id: i32,
    /// Minimum price increment, exchange-native units.
    pub tick_size: i64,
    /// Divisor converting raw prices to clean display units.
    pub price_shift: i64,
    /// Touched in the current packet.
    pub dirty: bool,
    /// A level-1 update or trade occurred in the current quote batch.
    pub inside_change: bool,
    /// A trade summary has matched this instrument.
    pub traded_locally: bool,
    /// The four-sided book.
    pub book: InstrumentBook,
    /// Iceberg tracker for the bid side.
    pub bid_icebergs: IcebergTracker,
    /// Iceberg tracker for the ask side.
    pub ask_icebergs: IcebergTracker,
    /// Sweep-run accumulator.
    pub sweep: SweepTracker,
    /// Stop-chain accumulator.
    pub stops: StopsTracker,
}

impl SecurityState {
    /// Create fresh state for an instrument.
    pub fn new(
        sec_id: i32,
        symbol: String,
        price_shift: i64,
        tick_size: i64,
        min_sweep_depth: i64,
    ) -> Self {
        Self {
            symbol,
            sec_id,
            tick_size,
            price_shift,
            dirty: false,
            inside_change: false,
            traded_locally: false,
            book: InstrumentBook::new(),
            bid_icebergs: IcebergTracker::new(SideKind::Bid),
            ask_icebergs: IcebergTracker::new(SideKind::Ask),
            sweep: SweepTracker::new(min_sweep_depth),
            stops: StopsTracker::new(),
        }
    }

    /// Convert a raw exchange price to clean display units.
    #[inline]
    pub fn clean_price(&self, raw: i64) -> i64 {
        raw / self.price_shift.max(1)
    }
}
