//! Stop-chain detection from the passive-order list attached to each trade
//! summary. The first (largest) order is the aggressor; a later order whose
//! quantity exceeds the running maximum, and whose id predates the chain's
//! first id, is a resting stop pulled into the move.

use tracing::trace;

use crate::book::SideKind;

/// One order in a stop chain. Index 0 of a chain is the aggressor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopsTrade {
    /// Exchange transact time of the summary that last touched this entry.
    pub exchange_time: u64,
    /// Wire order id.
    pub order_id: u64,
    /// Traded quantity plus any size later re-added to the book at the
    /// trigger price.
    pub size: u32,
    /// Quantity traded through this order.
    pub traded_size: u32,
    /// Clean price of the first trade of the event.
    pub start_price: i64,
    /// Clean price of the last trade entry seen when this order traded.
    pub highest_price: i64,
    /// Aggressor direction of the last trade entry of the summary.
    pub is_buy: bool,
}

/// One finalized trade event with at least one derived stop order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopsChain {
    /// Capture timestamp when the chain's first entry was created.
    pub ts: i64,
    /// Clean price of the first trade ever seen on the instrument.
    pub first_price: i64,
    /// Aggressor followed by derived stop orders.
    pub trades: Vec<StopsTrade>,
}

/// Per-instrument stop-chain accumulator.
#[derive(Debug, Clone, Default)]
pub struct StopsTracker {
    current: StopsChain,
    finalized: Vec<StopsChain>,
}

impl StopsTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the clean price of a trade entry. Only the first price ever
    /// seen sticks; it anchors `start_price` for every chain entry.
    pub fn note_trade_price(&mut self, clean_price: i64) {
        if self.current.first_price == 0 {
            self.current.first_price = clean_price;
        }
    }

    /// Consume the order group of one trade summary.
    ///
    /// `order_total` tracks the largest quantity seen so far, decremented
    /// by each smaller order it absorbs. An order larger than the running
    /// total opens a new chain entry when the chain is empty, or when its
    /// id differs from the last pushed and predates the chain's first id.
    /// Every such order refreshes the tail entry in place.
    pub fn consume_orders(
        &mut self,
        packet_ts: i64,
        transact_time: u64,
        is_buy: bool,
        last_price: i64,
        orders: &[(u64, i32)],
    ) {
        let mut order_total: u32 = 0;
        for &(order_id, qty) in orders {
            let qty = qty as u32;
            if qty > order_total {
                let chains = matches!(
                    (self.current.trades.last(), self.current.trades.first()),
                    (Some(last), Some(first))
                        if last.order_id != order_id && first.order_id > order_id
                );
                if self.current.trades.is_empty() || chains {
                    if self.current.trades.is_empty() {
                        self.current.ts = packet_ts;
                    }
                    self.current.trades.push(StopsTrade {
                        start_price: self.current.first_price,
                        order_id,
                        ..StopsTrade::default()
                    });
                    trace!(order_id, qty, "stop chain candidate");
                }
                if let Some(tail) = self.current.trades.last_mut() {
                    tail.exchange_time = transact_time;
                    tail.size += qty;
                    tail.traded_size += qty;
                    tail.is_buy = is_buy;
                    tail.highest_price = last_price;
                }
                order_total = qty;
            } else {
                order_total -= qty;
            }
        }
    }

    /// Credit size re-added to the book at a chain entry's trigger price.
    /// Only applies once the chain already links more than one order, and
    /// only when the added side matches the entry's direction.
    pub fn on_level_added(&mut self, price: i64, size: i32, side: SideKind) {
        if self.current.trades.len() <= 1 {
            return;
        }
        for trade in &mut self.current.trades {
            if price == trade.highest_price
                && ((trade.is_buy && side == SideKind::Bid)
                    || (!trade.is_buy && side == SideKind::Ask))
            {
                trade.size += size as u32;
                break;
            }
        }
    }

    /// Close the chain at a trade boundary. Chains linking more than one
    /// order are finalized; the working list and timestamp reset, while
    /// `first_price` keeps its first-ever value.
    pub fn close(&mut self) {
        if self.current.trades.len() > 1 {
            self.finalized.push(self.current.clone());
        }
        self.current.trades.clear();
        self.current.ts = 0;
    }

    /// Finalized chains accumulated over the run.
    pub fn finalized(&self) -> &[StopsChain] {
        &self.finalized
    }

    /// Consume the tracker for end-of-run emission.
    pub fn into_finalized(self) -> Vec<StopsChain> {
        self.finalized
    }
}
