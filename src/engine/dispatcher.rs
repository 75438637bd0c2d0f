//! Message dispatch and boundary handling.
//!
//! Messages of a packet are applied in wire order. Each refresh message
//! carries an indicator byte; after applying a message the dispatcher
//! processes the trade, quote, and packet boundaries its bits signal, in
//! that order.

use std::io::Write;

use tracing::{debug, trace};
use zerocopy::FromBytes;

use crate::book::{BookSide, Level, SideKind};
use crate::detector::Aggressor;
use crate::feed::{
    BOOK_ENTRY_LEN, BookAction, BookEntry, EventHeader, Indicator, MESSAGE_HEADER_LEN,
    MessageHeader, ORDER_ENTRY_LEN, OrderEntry, OrderGroupHeader, PacketHeader,
    TEMPLATE_ADMIN_HEARTBEAT, TEMPLATE_BOOK_REFRESH, TEMPLATE_ORDER_BOOK_REFRESH,
    TEMPLATE_TRADE_SUMMARY, TRADE_ENTRY_LEN, TradeEntry, entry_type, udp_payload,
};
use crate::report::{IcebergRecord, Reports, StopsRecord, SweepRecord};
use crate::utils::format_ns_timestamp;

use super::error::AnalyzerError;
use super::registry::SecurityRegistry;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Capture records seen.
    pub packets: u64,
    /// Frames skipped before the MDP payload (non-IPv4, short frames).
    pub skipped_frames: u64,
    /// MDP messages dispatched.
    pub messages: u64,
    /// Messages abandoned as malformed (the rest of the packet with them).
    pub malformed_messages: u64,
    /// Group entries referencing ids missing from the symbol file.
    pub unknown_entries: u64,
    /// Sweep rows written.
    pub sweeps: u64,
    /// Iceberg rows written.
    pub icebergs: u64,
    /// Stop rows written.
    pub stops: u64,
}

/// Routes decoded messages into per-instrument state and drains detector
/// events into the report writers at indicator boundaries.
pub struct Dispatcher<W: Write> {
    registry: SecurityRegistry,
    reports: Reports<W>,
    stats: RunStats,
}

impl<W: Write> Dispatcher<W> {
    /// Create a dispatcher over a registry and open report writers.
    pub fn new(registry: SecurityRegistry, reports: Reports<W>) -> Self {
        Self {
            registry,
            reports,
            stats: RunStats::default(),
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Read access to the instrument registry.
    pub fn registry(&self) -> &SecurityRegistry {
        &self.registry
    }

    /// Apply one captured frame (Ethernet onward, link padding already
    /// stripped) with its capture timestamp.
    pub fn process_packet(&mut self, ts: i64, frame: &[u8]) -> Result<(), AnalyzerError> {
        self.stats.packets += 1;
        let Some(payload) = udp_payload(frame) else {
            self.stats.skipped_frames += 1;
            trace!(len = frame.len(), "skipping non-UDP/IPv4 frame");
            return Ok(());
        };
        let Ok((_channel, mut buf)) = PacketHeader::ref_from_prefix(payload) else {
            self.stats.skipped_frames += 1;
            return Ok(());
        };

        while !buf.is_empty() {
            let Ok(header) = MessageHeader::read_from_prefix(buf).map(|(h, _)| h) else {
                self.abort_packet("truncated message header");
                break;
            };
            let msg_length = header.msg_length.get() as usize;
            if msg_length < MESSAGE_HEADER_LEN || msg_length > buf.len() {
                self.abort_packet("message length out of bounds");
                break;
            }
            let body = &buf[MESSAGE_HEADER_LEN..msg_length];

            self.stats.messages += 1;
            let indicator = match header.template_id.get() {
                TEMPLATE_BOOK_REFRESH => self.apply_book_refresh(ts, body),
                TEMPLATE_TRADE_SUMMARY => self.apply_trade_summary(ts, body),
                TEMPLATE_ORDER_BOOK_REFRESH | TEMPLATE_ADMIN_HEARTBEAT => {
                    Some(Indicator::empty())
                }
                other => {
                    trace!(template_id = other, "ignoring unhandled template");
                    Some(Indicator::empty())
                }
            };
            let Some(indicator) = indicator else {
                self.abort_packet("truncated message body");
                break;
            };

            self.process_boundaries(ts, indicator)?;
            buf = &buf[msg_length..];
        }
        Ok(())
    }

    /// Drop the rest of the packet and reset packet-scoped state, so the
    /// next packet starts with a clean dirty set.
    fn abort_packet(&mut self, reason: &'static str) {
        trace!(reason, "abandoning packet");
        self.stats.malformed_messages += 1;
        self.registry.clear_packet();
    }

    /// Template 32: apply each entry to the addressed side of the
    /// addressed instrument. Returns `None` when the body is truncated.
    fn apply_book_refresh(&mut self, _ts: i64, body: &[u8]) -> Option<Indicator> {
        let (header, mut entries) = EventHeader::ref_from_prefix(body).ok()?;
        let entry_size = (header.entry_size.get() as usize).max(BOOK_ENTRY_LEN);

        for _ in 0..header.num_in_group {
            if entries.len() < entry_size {
                return None;
            }
            let (entry, _) = BookEntry::ref_from_prefix(entries).ok()?;
            entries = &entries[entry_size..];

            let security = match self.registry.touch(entry.sec_id.get()) {
                Ok(security) => security,
                Err(unknown) => {
                    self.stats.unknown_entries += 1;
                    trace!(%unknown, "skipping book entry");
                    continue;
                }
            };

            let action = BookAction::from_wire(entry.action_type);
            let level = Level::new(
                entry.price.get(),
                entry.size.get(),
                entry.num_orders.get(),
            );
            let outright_side = match entry.entry_type {
                entry_type::BID => {
                    apply_entry(&mut security.book.bids, action, entry.price_level, level);
                    Some(SideKind::Bid)
                }
                entry_type::ASK => {
                    apply_entry(&mut security.book.asks, action, entry.price_level, level);
                    Some(SideKind::Ask)
                }
                entry_type::IMPLIED_BID => {
                    apply_entry(
                        &mut security.book.implied_bids,
                        action,
                        entry.price_level,
                        level,
                    );
                    None
                }
                entry_type::IMPLIED_ASK => {
                    apply_entry(
                        &mut security.book.implied_asks,
                        action,
                        entry.price_level,
                        level,
                    );
                    None
                }
                _ => None,
            };

            security.inside_change |= entry.price_level == 1;
            if action == Some(BookAction::Add) {
                if let Some(side) = outright_side {
                    security
                        .stops
                        .on_level_added(entry.price.get(), entry.size.get(), side);
                }
            }
        }

        Some(header.indicator())
    }

    /// Template 42: fold each trade entry into the sweep, iceberg, and
    /// stops state of its instrument, then hand the trailing order group
    /// to the stops tracker of the packet's most recently dirtied
    /// instrument. Returns `None` when the body is truncated.
    fn apply_trade_summary(&mut self, ts: i64, body: &[u8]) -> Option<Indicator> {
        let (header, mut rest) = EventHeader::ref_from_prefix(body).ok()?;
        let entry_size = (header.entry_size.get() as usize).max(TRADE_ENTRY_LEN);
        let transact_time = header.transact_time.get();

        let mut is_buy = false;
        let mut last_price = 0i64;

        for _ in 0..header.num_in_group {
            if rest.len() < entry_size {
                return None;
            }
            let (entry, _) = TradeEntry::ref_from_prefix(rest).ok()?;
            rest = &rest[entry_size..];

            let security = match self.registry.touch(entry.sec_id.get()) {
                Ok(security) => security,
                Err(unknown) => {
                    self.stats.unknown_entries += 1;
                    trace!(%unknown, "skipping trade entry");
                    continue;
                }
            };

            let aggressor = Aggressor::from_wire(entry.aggressor_side);
            let price = security.clean_price(entry.price.get());
            trace!(
                symbol = %security.symbol,
                price,
                qty = entry.qty.get(),
                ?aggressor,
                "trade"
            );

            security.inside_change = true;
            security.traded_locally = true;
            security
                .sweep
                .on_trade(ts, transact_time, price, entry.qty.get(), aggressor);
            security.stops.note_trade_price(price);

            match aggressor {
                Aggressor::Buy => {
                    security.ask_icebergs.add_trade(
                        &security.book.asks,
                        entry.price.get(),
                        entry.qty.get(),
                    );
                    is_buy = true;
                }
                Aggressor::Sell => {
                    security.bid_icebergs.add_trade(
                        &security.book.bids,
                        entry.price.get(),
                        entry.qty.get(),
                    );
                    is_buy = false;
                }
                Aggressor::None | Aggressor::Other(_) => {}
            }
            last_price = price;
        }

        // The order group is attributed to the packet's most recently
        // dirtied instrument, which for well-formed feeds is the traded
        // one.
        if let Some(sec_id) = self.registry.last_dirty() {
            let (group, mut orders_buf) = OrderGroupHeader::ref_from_prefix(rest).ok()?;
            let security = self.registry.get_mut(sec_id)?;
            if security.traded_locally {
                let count = group.num_in_group as usize;
                let mut orders = Vec::with_capacity(count);
                for _ in 0..count {
                    if orders_buf.len() < ORDER_ENTRY_LEN {
                        return None;
                    }
                    let (order, next) = OrderEntry::ref_from_prefix(orders_buf).ok()?;
                    orders.push((order.order_id.get(), order.qty.get()));
                    orders_buf = next;
                }
                security
                    .stops
                    .consume_orders(ts, transact_time, is_buy, last_price, &orders);
            }
        }

        Some(header.indicator())
    }

    /// Handle the boundaries a message's indicator bits signal.
    fn process_boundaries(
        &mut self,
        ts: i64,
        indicator: Indicator,
    ) -> Result<(), AnalyzerError> {
        if indicator.contains(Indicator::LAST_TRADE) {
            self.close_trades()?;
        }
        if indicator.contains(Indicator::LAST_QUOTE) {
            self.close_quotes(ts);
        }
        if indicator.contains(Indicator::LAST_MSG) {
            self.registry.clear_packet();
        }
        Ok(())
    }

    /// Trade boundary: emit qualifying sweeps and flush linked stop chains
    /// for every instrument the packet touched.
    fn close_trades(&mut self) -> Result<(), AnalyzerError> {
        for sec_id in self.registry.packet_dirty().to_vec() {
            let Some(security) = self.registry.get_mut(sec_id) else {
                continue;
            };
            if let Some(sweep) = security.sweep.close() {
                debug!(
                    symbol = %security.symbol,
                    start_price = sweep.start_price,
                    end_price = sweep.end_price,
                    total = sweep.total_volume,
                    is_buy = sweep.is_buy,
                    "sweep"
                );
                let record = SweepRecord {
                    ts: format_ns_timestamp(sweep.start_time),
                    symbol: &security.symbol,
                    start_price: sweep.start_price,
                    end_price: sweep.end_price,
                    total_traded: sweep.total_volume,
                    aggr_side: sweep.is_buy as u8,
                };
                self.reports.write_sweep(&record)?;
                self.stats.sweeps += 1;
            }
            let Some(security) = self.registry.get_mut(sec_id) else {
                continue;
            };
            security.stops.close();
        }
        Ok(())
    }

    /// Quote boundary: run the iceberg check on both sides of every dirty
    /// instrument, then reset the per-batch trade marks.
    fn close_quotes(&mut self, ts: i64) {
        for sec_id in self.registry.packet_dirty().to_vec() {
            let Some(security) = self.registry.get_mut(sec_id) else {
                continue;
            };

            let sell_iceberg = security.ask_icebergs.check(&security.book.asks, ts);
            let buy_iceberg = security.bid_icebergs.check(&security.book.bids, ts);
            for iceberg in [sell_iceberg, buy_iceberg].into_iter().flatten() {
                debug!(
                    symbol = %security.symbol,
                    price = security.clean_price(iceberg.price),
                    show_size = iceberg.show_quantity,
                    total_traded = iceberg.total_traded,
                    is_bid = iceberg.is_bid,
                    "iceberg"
                );
            }

            security.inside_change = false;
            security.ask_icebergs.clear_trade();
            security.bid_icebergs.clear_trade();
        }
    }

    /// End of run: emit finalized stop chains and icebergs per instrument
    /// in ascending security-id order, then hand back the writers.
    pub fn finish(mut self) -> Result<(RunStats, Reports<W>), AnalyzerError> {
        for security in self.registry.into_securities() {
            let shift = security.price_shift.max(1);
            let symbol = security.symbol;

            for chain in security.stops.into_finalized() {
                let Some(first) = chain.trades.first() else {
                    continue;
                };
                let ts = format_ns_timestamp(chain.ts);
                for trade in &chain.trades[1..] {
                    self.reports.write_stop(&StopsRecord {
                        ts: ts.clone(),
                        exchange_ts: format_ns_timestamp(trade.exchange_time as i64),
                        symbol: &symbol,
                        order_id: trade.order_id,
                        trigger_price: first.start_price,
                        order_size: trade.size,
                        traded_size: trade.traded_size,
                        side: if trade.is_buy { 'B' } else { 'S' },
                    })?;
                    self.stats.stops += 1;
                }
            }

            let mut icebergs = security.bid_icebergs.into_finalized();
            icebergs.extend(security.ask_icebergs.into_finalized());
            icebergs.sort_by_key(|iceberg| iceberg.ts);
            for iceberg in icebergs {
                if iceberg.total_traded <= iceberg.show_quantity {
                    continue;
                }
                self.reports.write_iceberg(&IcebergRecord {
                    ts: format_ns_timestamp(iceberg.ts),
                    symbol: &symbol,
                    price: iceberg.price / shift,
                    show_size: iceberg.show_quantity,
                    traded_size: iceberg.total_traded,
                    side: if iceberg.is_bid { 'B' } else { 'S' },
                })?;
                self.stats.icebergs += 1;
            }
        }

        Ok((self.stats, self.reports))
    }
}

/// Apply one wire entry to a side. `price_level` is the 1-based wire
/// field; a zero level or an unknown action leaves the side untouched.
fn apply_entry(side: &mut BookSide, action: Option<BookAction>, price_level: u8, level: Level) {
    let level_no = price_level as usize;
    match action {
        Some(BookAction::Add) => {
            if let Some(index) = level_no.checked_sub(1) {
                side.add(index, level);
            }
        }
        Some(BookAction::Update) => {
            if let Some(index) = level_no.checked_sub(1) {
                side.update(index, level);
            }
        }
        Some(BookAction::Delete) => {
            if let Some(index) = level_no.checked_sub(1) {
                side.delete(index);
            }
        }
        Some(BookAction::DeleteThru) => side.delete_thru(level_no),
        Some(BookAction::DeleteFrom) => side.delete_from(level_no),
        None => {}
    }
}
