//! Hidden-liquidity detection by the replenishment signature: a level is
//! fully consumed by a trade at least as large as its visible quantity,
//! then reappears at the same price in the next book snapshot. Repeated
//! replenishments at one price fold into a single record.

use std::collections::BTreeMap;

use crate::book::{BookSide, Level, SideKind};

/// One inferred iceberg order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Iceberg {
    /// Capture timestamp of the first replenishment, nanoseconds.
    pub ts: i64,
    /// Exchange-native price of the replenishing level.
    pub price: i64,
    /// Smallest visible quantity observed across replenishments.
    pub show_quantity: i32,
    /// Total quantity inferred traded through the level.
    pub total_traded: i32,
    /// True when the level sat on the bid side.
    pub is_bid: bool,
    /// Resting order ids attributed to the iceberg, by id. Reserved in the
    /// record shape; nothing populates it in this version.
    pub order_ids: BTreeMap<u64, i32>,
}

/// The most aggressive trade seen against this side since the last quote
/// boundary.
#[derive(Debug, Clone, Copy, Default)]
struct TradeMark {
    price: i64,
    quantity: i32,
}

/// Per-side iceberg tracker. The dispatcher feeds it the side's aggressive
/// trades as they arrive and runs [`IcebergTracker::check`] at each quote
/// boundary with the current outright side.
#[derive(Debug, Clone)]
pub struct IcebergTracker {
    side: SideKind,
    /// Snapshot of the level that matched the best trade price when the
    /// trade was recorded.
    prev_top: Level,
    best_trade: TradeMark,
    /// In-progress icebergs keyed by price.
    open: BTreeMap<i64, Iceberg>,
    finalized: Vec<Iceberg>,
}

impl IcebergTracker {
    /// Create a tracker for one side of an instrument.
    pub fn new(side: SideKind) -> Self {
        Self {
            side,
            prev_top: Level::default(),
            best_trade: TradeMark::default(),
            open: BTreeMap::new(),
            finalized: Vec::new(),
        }
    }

    /// Record a trade whose aggressor hit this side. Keeps only the most
    /// aggressive trade of the batch (highest price against asks, lowest
    /// against bids) and snapshots the book level matching its price.
    pub fn add_trade(&mut self, outrights: &BookSide, price: i64, quantity: i32) {
        let supersedes = match self.side {
            SideKind::Ask => price > self.best_trade.price,
            SideKind::Bid => price < self.best_trade.price,
        };
        if self.best_trade.quantity == 0 || supersedes {
            self.best_trade = TradeMark { price, quantity };
            // Last match wins, as the wire never carries duplicate prices.
            for level in outrights.levels() {
                if level.price == price {
                    self.prev_top = *level;
                }
            }
        }
    }

    /// Evaluate the replenishment signature at a quote boundary.
    ///
    /// Open icebergs at prices now strictly more aggressive than the top
    /// are closed out. When the batch's best trade consumed the remembered
    /// top level and the side has replenished back to the same price, an
    /// iceberg is opened at that price, or the existing one is extended.
    /// Returns a snapshot of the iceberg this call detected or confirmed.
    pub fn check(&mut self, outrights: &BookSide, ts: i64) -> Option<Iceberg> {
        let top = *outrights.top()?;

        let stale: Vec<i64> = self
            .open
            .keys()
            .copied()
            .filter(|&price| self.side.more_aggressive(price, top.price))
            .collect();
        for price in stale {
            if let Some(iceberg) = self.open.remove(&price) {
                self.finalized.push(iceberg);
            }
        }

        let is_iceberg = self.best_trade.quantity != 0
            && self.best_trade.price == self.prev_top.price
            && self.best_trade.quantity >= self.prev_top.quantity
            && top.price == self.prev_top.price;
        if !is_iceberg {
            return None;
        }

        let consumed = self.best_trade.quantity - (self.prev_top.quantity - top.quantity);
        let iceberg = self
            .open
            .entry(top.price)
            .and_modify(|iceberg| {
                iceberg.show_quantity = iceberg.show_quantity.min(top.quantity);
                iceberg.total_traded += consumed;
            })
            .or_insert_with(|| Iceberg {
                ts,
                price: top.price,
                show_quantity: top.quantity,
                total_traded: consumed,
                is_bid: self.side == SideKind::Bid,
                order_ids: BTreeMap::new(),
            });
        Some(iceberg.clone())
    }

    /// Forget the batch's best trade at a quote boundary. The remembered
    /// top-level snapshot persists until a later trade supersedes it.
    pub fn clear_trade(&mut self) {
        self.best_trade.quantity = 0;
    }

    /// Close out at end of run: any still-open icebergs join the finalized
    /// list, which is returned for emission.
    pub fn into_finalized(mut self) -> Vec<Iceberg> {
        self.finalized.extend(std::mem::take(&mut self.open).into_values());
        self.finalized
    }
}
