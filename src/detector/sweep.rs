//! Sweep detection: an aggressive trade run accumulated per instrument
//! between trade boundaries, emitted when it crossed enough price distance.

use tracing::trace;

use super::Aggressor;

/// A completed sweep ready for reporting. Prices are clean (display) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepEvent {
    /// Capture timestamp of the first trade in the run, nanoseconds.
    pub start_time: i64,
    /// Exchange transact time of the message starting the run.
    pub exchange_time: u64,
    /// Clean price of the first trade.
    pub start_price: i64,
    /// Clean price of the last trade.
    pub end_price: i64,
    /// Total quantity across the run.
    pub total_volume: i64,
    /// True when the buyer was the aggressor.
    pub is_buy: bool,
}

/// Per-instrument sweep accumulator.
#[derive(Debug, Clone)]
pub struct SweepTracker {
    start_time: i64,
    exchange_time: u64,
    start_price: i64,
    end_price: i64,
    total_volume: i64,
    is_buy: bool,
    /// True until the first trade of a run fixes the start and direction.
    first_aggressor: bool,
    /// Set when any trade of the run had no aggressor side; the whole run
    /// is discarded at the boundary.
    ignore_trades: bool,
    /// Minimum clean-price distance a run must cross to be emitted.
    min_depth: i64,
}

impl SweepTracker {
    /// Create a tracker with the given emission threshold.
    pub fn new(min_depth: i64) -> Self {
        Self {
            start_time: 0,
            exchange_time: 0,
            start_price: 0,
            end_price: 0,
            total_volume: 0,
            is_buy: false,
            first_aggressor: true,
            ignore_trades: false,
            min_depth,
        }
    }

    /// Fold one trade entry into the run.
    pub fn on_trade(
        &mut self,
        packet_ts: i64,
        transact_time: u64,
        clean_price: i64,
        quantity: i32,
        aggressor: Aggressor,
    ) {
        if aggressor == Aggressor::None {
            self.ignore_trades = true;
        }
        if self.first_aggressor {
            self.start_time = packet_ts;
            self.exchange_time = transact_time;
            self.start_price = clean_price;
            self.is_buy = aggressor == Aggressor::Buy;
            self.first_aggressor = false;
        }
        self.total_volume += i64::from(quantity);
        self.end_price = clean_price;
    }

    /// Close the run at a trade boundary. Returns the event when the run
    /// crossed more than `min_depth` in its own direction and no trade was
    /// aggressor-less; always resets the accumulator.
    pub fn close(&mut self) -> Option<SweepEvent> {
        let depth_crossed = if self.is_buy {
            self.end_price - self.start_price > self.min_depth
        } else {
            self.start_price - self.end_price > self.min_depth
        };
        let event = (depth_crossed && !self.ignore_trades).then(|| SweepEvent {
            start_time: self.start_time,
            exchange_time: self.exchange_time,
            start_price: self.start_price,
            end_price: self.end_price,
            total_volume: self.total_volume,
            is_buy: self.is_buy,
        });
        if self.ignore_trades && depth_crossed {
            trace!(
                start_price = self.start_price,
                end_price = self.end_price,
                "discarding sweep run with aggressor-less trade"
            );
        }

        self.start_time = 0;
        self.exchange_time = 0;
        self.start_price = 0;
        self.end_price = 0;
        self.total_volume = 0;
        self.is_buy = false;
        self.first_aggressor = true;
        self.ignore_trades = false;

        event
    }
}
