//! Dispatcher scenarios: template routing, boundary handling, and the
//! three detectors driven through synthetic packets.

use mdp_sleuth::{Dispatcher, Level, SecurityRegistry};

use crate::helpers::*;

const LAST_TRADE: u8 = 0x01;
const LAST_QUOTE: u8 = 0x04;
const LAST_MSG: u8 = 0x80;

fn dispatcher(registry: SecurityRegistry) -> Dispatcher<Vec<u8>> {
    Dispatcher::new(registry, buffer_reports())
}

#[test]
fn test_book_refresh_builds_book() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let msg = book_refresh(
        1_000,
        LAST_QUOTE | LAST_MSG,
        &[
            WireBookEntry::bid_add(7, 1, 101, 5),
            WireBookEntry::bid_add(7, 2, 100, 3),
        ],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let security = dispatcher.registry().get(7).expect("instrument");
    assert_eq!(security.book.bids.levels().len(), 2);
    assert_eq!(security.book.bids.top(), Some(&Level::new(101, 5, 1)));
    assert_eq!(security.book.bids.level(1), Some(&Level::new(100, 3, 1)));
    assert_eq!(dispatcher.stats().messages, 1);
}

#[test]
fn test_unknown_security_leaves_state_untouched() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let msg = book_refresh(
        1_000,
        LAST_MSG,
        &[WireBookEntry::bid_add(99, 1, 101, 5)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    assert!(dispatcher.registry().is_empty());
    assert_eq!(dispatcher.stats().unknown_entries, 1);
    assert_eq!(dispatcher.stats().malformed_messages, 0);
}

#[test]
fn test_dirty_set_appends_once_per_packet() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    // Two messages touch the same instrument; neither ends the packet.
    let msgs = [
        book_refresh(1_000, 0, &[WireBookEntry::bid_add(7, 1, 101, 5)]),
        book_refresh(1_001, 0, &[WireBookEntry::bid_add(7, 2, 100, 3)]),
    ];
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&msgs)))
        .expect("process");
    assert_eq!(dispatcher.registry().packet_dirty(), &[7]);

    // The next packet's terminal message clears the set.
    let closer = book_refresh(1_002, LAST_MSG, &[WireBookEntry::bid_add(7, 1, 102, 1)]);
    dispatcher
        .process_packet(11, &frame(&mdp_packet(&[closer])))
        .expect("process");
    assert!(dispatcher.registry().packet_dirty().is_empty());
    assert!(!dispatcher.registry().get(7).expect("instrument").dirty);
}

#[test]
fn test_sweep_emitted_across_price_levels() {
    let mut dispatcher = dispatcher(single_instrument_registry(2));
    let trades = [
        WireTradeEntry { price: 100, qty: 3, sec_id: 7, aggressor: 1 },
        WireTradeEntry { price: 101, qty: 3, sec_id: 7, aggressor: 1 },
        WireTradeEntry { price: 103, qty: 3, sec_id: 7, aggressor: 1 },
    ];
    let msg = trade_summary(5_000, LAST_TRADE | LAST_MSG, &trades, &[]);
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.sweeps, 1);

    let (sweeps, _, _) = reports.into_writers().expect("writers");
    let rows = csv_rows(sweeps);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with("ESZ5,100,103,9,1"), "row: {}", rows[0]);
}

#[test]
fn test_sweep_suppressed_by_aggressorless_trade() {
    let mut dispatcher = dispatcher(single_instrument_registry(2));
    let trades = [
        WireTradeEntry { price: 100, qty: 3, sec_id: 7, aggressor: 1 },
        WireTradeEntry { price: 101, qty: 3, sec_id: 7, aggressor: 0 },
        WireTradeEntry { price: 103, qty: 3, sec_id: 7, aggressor: 1 },
    ];
    let msg = trade_summary(5_000, LAST_TRADE | LAST_MSG, &trades, &[]);
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.sweeps, 0);
    let (sweeps, _, _) = reports.into_writers().expect("writers");
    assert!(csv_rows(sweeps).is_empty());
}

#[test]
fn test_sell_sweep_direction() {
    let mut dispatcher = dispatcher(single_instrument_registry(1));
    let trades = [
        WireTradeEntry { price: 105, qty: 2, sec_id: 7, aggressor: 2 },
        WireTradeEntry { price: 102, qty: 4, sec_id: 7, aggressor: 2 },
    ];
    let msg = trade_summary(5_000, LAST_TRADE | LAST_MSG, &trades, &[]);
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let (_, reports) = dispatcher.finish().expect("finish");
    let (sweeps, _, _) = reports.into_writers().expect("writers");
    let rows = csv_rows(sweeps);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with("ESZ5,105,102,6,0"), "row: {}", rows[0]);
}

#[test]
fn test_iceberg_detected_after_replenishment() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));

    // Seed the bid book.
    let seed = book_refresh(
        1_000,
        LAST_QUOTE | LAST_MSG,
        &[WireBookEntry::bid_add(7, 1, 100, 10)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[seed])))
        .expect("seed");

    // Two rounds of: full consumption by a sell aggressor, then the level
    // reappears at the same price in the closing quote.
    for ts in [20, 30] {
        let trade = trade_summary(
            2_000,
            LAST_TRADE,
            &[WireTradeEntry { price: 100, qty: 10, sec_id: 7, aggressor: 2 }],
            &[(1, 10)],
        );
        let replenish = book_refresh(2_001, LAST_QUOTE | LAST_MSG, &[WireBookEntry {
            price: 100,
            size: 10,
            sec_id: 7,
            num_orders: 1,
            price_level: 1,
            action: 1,
            entry_type: b'0',
        }]);
        dispatcher
            .process_packet(ts, &frame(&mdp_packet(&[trade, replenish])))
            .expect("round");
    }

    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.icebergs, 1);

    let (_, icebergs, _) = reports.into_writers().expect("writers");
    let rows = csv_rows(icebergs);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with("ESZ5,100,10,20,B"), "row: {}", rows[0]);
}

#[test]
fn test_single_fill_iceberg_not_reported() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let seed = book_refresh(
        1_000,
        LAST_QUOTE | LAST_MSG,
        &[WireBookEntry::bid_add(7, 1, 100, 10)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[seed])))
        .expect("seed");

    let trade = trade_summary(
        2_000,
        LAST_TRADE,
        &[WireTradeEntry { price: 100, qty: 10, sec_id: 7, aggressor: 2 }],
        &[(1, 10)],
    );
    let replenish = book_refresh(2_001, LAST_QUOTE | LAST_MSG, &[WireBookEntry {
        price: 100,
        size: 10,
        sec_id: 7,
        num_orders: 1,
        price_level: 1,
        action: 1,
        entry_type: b'0',
    }]);
    dispatcher
        .process_packet(20, &frame(&mdp_packet(&[trade, replenish])))
        .expect("round");

    // One replenishment: traded equals the display size, below the bar.
    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.icebergs, 0);
    let (_, icebergs, _) = reports.into_writers().expect("writers");
    assert!(csv_rows(icebergs).is_empty());
}

#[test]
fn test_stop_chain_from_order_group() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let msg = trade_summary(
        5_000,
        LAST_TRADE | LAST_MSG,
        &[WireTradeEntry { price: 100, qty: 9, sec_id: 7, aggressor: 1 }],
        &[(100, 5), (50, 7), (60, 3)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.stops, 1);

    let (_, _, stops) = reports.into_writers().expect("writers");
    let rows = csv_rows(stops);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].ends_with("ESZ5,50,100,7,7,B"), "row: {}", rows[0]);
}

#[test]
fn test_stop_chain_credited_by_level_add() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let trade = trade_summary(
        5_000,
        0,
        &[WireTradeEntry { price: 100, qty: 9, sec_id: 7, aggressor: 1 }],
        &[(100, 5), (50, 7)],
    );
    // Size re-added on the bid at the chain's last trade price before the
    // trade boundary closes the chain.
    let readd = book_refresh(
        5_001,
        LAST_TRADE | LAST_MSG,
        &[WireBookEntry::bid_add(7, 1, 100, 4)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[trade, readd])))
        .expect("process");

    let (_, reports) = dispatcher.finish().expect("finish");
    let (_, _, stops) = reports.into_writers().expect("writers");
    let rows = csv_rows(stops);
    assert_eq!(rows.len(), 1);
    // The credit lands on the first matching entry, the aggressor, so the
    // derived stop row itself is unchanged.
    assert!(rows[0].ends_with("ESZ5,50,100,7,7,B"), "row: {}", rows[0]);
}

#[test]
fn test_unlinked_order_group_yields_no_chain() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let msg = trade_summary(
        5_000,
        LAST_TRADE | LAST_MSG,
        &[WireTradeEntry { price: 100, qty: 5, sec_id: 7, aggressor: 1 }],
        &[(100, 5), (60, 3)],
    );
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    let (stats, reports) = dispatcher.finish().expect("finish");
    assert_eq!(stats.stops, 0);
    let (_, _, stops) = reports.into_writers().expect("writers");
    assert!(csv_rows(stops).is_empty());
}

#[test]
fn test_malformed_message_aborts_packet() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    // A message header claiming far more bytes than the packet carries,
    // followed by a well-formed message that must not be reached.
    let mut bad = Vec::new();
    bad.extend_from_slice(&200u16.to_le_bytes());
    bad.extend_from_slice(&11u16.to_le_bytes());
    bad.extend_from_slice(&32u16.to_le_bytes());
    bad.extend_from_slice(&1u16.to_le_bytes());
    bad.extend_from_slice(&9u16.to_le_bytes());
    bad.extend_from_slice(&[0u8; 4]);
    let good = book_refresh(1_000, LAST_MSG, &[WireBookEntry::bid_add(7, 1, 101, 5)]);

    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[bad, good])))
        .expect("process");

    assert_eq!(dispatcher.stats().malformed_messages, 1);
    assert!(dispatcher.registry().is_empty());
    assert!(dispatcher.registry().packet_dirty().is_empty());
}

#[test]
fn test_non_ipv4_frame_counted_and_skipped() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let msg = book_refresh(1_000, LAST_MSG, &[WireBookEntry::bid_add(7, 1, 101, 5)]);
    let mut bytes = frame(&mdp_packet(&[msg]));
    bytes[12] = 0x08;
    bytes[13] = 0x06;

    dispatcher.process_packet(10, &bytes).expect("process");
    assert_eq!(dispatcher.stats().skipped_frames, 1);
    assert_eq!(dispatcher.stats().messages, 0);
}

#[test]
fn test_combined_boundaries_in_one_indicator() {
    let mut dispatcher = dispatcher(single_instrument_registry(1));
    let trades = [
        WireTradeEntry { price: 100, qty: 2, sec_id: 7, aggressor: 1 },
        WireTradeEntry { price: 103, qty: 2, sec_id: 7, aggressor: 1 },
    ];
    let msg = trade_summary(5_000, LAST_TRADE | LAST_QUOTE | LAST_MSG, &trades, &[]);
    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[msg])))
        .expect("process");

    // Trade boundary emitted the sweep, message boundary cleared the set.
    assert_eq!(dispatcher.stats().sweeps, 1);
    assert!(dispatcher.registry().packet_dirty().is_empty());
}

#[test]
fn test_ignored_templates_still_dispatch() {
    let mut dispatcher = dispatcher(single_instrument_registry(0));
    let mut unknown = Vec::new();
    unknown.extend_from_slice(&14u16.to_le_bytes());
    unknown.extend_from_slice(&4u16.to_le_bytes());
    unknown.extend_from_slice(&43u16.to_le_bytes());
    unknown.extend_from_slice(&1u16.to_le_bytes());
    unknown.extend_from_slice(&9u16.to_le_bytes());
    unknown.extend_from_slice(&[0u8; 4]);
    let book = book_refresh(1_000, LAST_MSG, &[WireBookEntry::bid_add(7, 1, 101, 5)]);

    dispatcher
        .process_packet(10, &frame(&mdp_packet(&[unknown, book])))
        .expect("process");

    assert_eq!(dispatcher.stats().messages, 2);
    assert!(dispatcher.registry().get(7).is_some());
}
