//! Full-pipeline runs over synthetic ERF captures written to disk.

use std::fs;

use mdp_sleuth::{RunConfig, run};

use crate::helpers::*;

const LAST_TRADE: u8 = 0x01;
const LAST_QUOTE: u8 = 0x04;
const LAST_MSG: u8 = 0x80;

#[test]
fn test_capture_to_csv_reports() {
    let dir = tempfile::tempdir().expect("temp dir");
    let symbols = dir.path().join("cme_ids.txt");
    fs::write(&symbols, "ESZ5,7,1,25\nNQZ5,8,1,25\n").expect("symbols");

    let mut capture = Vec::new();

    // Packet 1: seed the bid book.
    let seed = book_refresh(
        1_000,
        LAST_QUOTE | LAST_MSG,
        &[WireBookEntry::bid_add(7, 1, 100, 10)],
    );
    capture.extend_from_slice(&erf_record(100, 0, &frame(&mdp_packet(&[seed]))));

    // Packets 2 and 3: consume the level, watch it replenish.
    for seconds in [101, 102] {
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
        capture.extend_from_slice(&erf_record(
            seconds,
            0,
            &frame(&mdp_packet(&[trade, replenish])),
        ));
    }

    // Packet 4: a buy run over three levels with a chained stop order.
    let sweep = trade_summary(
        3_000,
        LAST_TRADE | LAST_MSG,
        &[
            WireTradeEntry { price: 100, qty: 3, sec_id: 7, aggressor: 1 },
            WireTradeEntry { price: 101, qty: 3, sec_id: 7, aggressor: 1 },
            WireTradeEntry { price: 103, qty: 3, sec_id: 7, aggressor: 1 },
        ],
        &[(100, 5), (50, 7), (60, 3)],
    );
    capture.extend_from_slice(&erf_record(103, 500, &frame(&mdp_packet(&[sweep]))));

    let capture_path = dir.path().join("session.erf");
    fs::write(&capture_path, &capture).expect("capture");

    let config = RunConfig {
        capture: capture_path,
        sweeps: dir.path().join("sweeps.csv"),
        icebergs: dir.path().join("icebergs.csv"),
        stops: dir.path().join("stops.csv"),
        symbols,
        min_sweep_depth: 2,
    };
    let stats = run(&config).expect("run");

    assert_eq!(stats.packets, 4);
    assert_eq!(stats.messages, 6);
    assert_eq!(stats.sweeps, 1);
    assert_eq!(stats.icebergs, 1);
    assert_eq!(stats.stops, 1);

    let sweeps = fs::read_to_string(&config.sweeps).expect("sweeps csv");
    let mut lines = sweeps.lines();
    assert_eq!(
        lines.next(),
        Some("ts,symbol,start_price,end_price,total_traded,aggr_side")
    );
    let row = lines.next().expect("sweep row");
    assert!(row.ends_with("ESZ5,100,103,9,1"), "row: {row}");

    let icebergs = fs::read_to_string(&config.icebergs).expect("icebergs csv");
    let row = icebergs.lines().nth(1).expect("iceberg row");
    assert!(row.ends_with("ESZ5,100,10,20,B"), "row: {row}");

    let stops = fs::read_to_string(&config.stops).expect("stops csv");
    let row = stops.lines().nth(1).expect("stops row");
    assert!(row.ends_with("ESZ5,50,100,7,7,B"), "row: {row}");
}

#[test]
fn test_empty_capture_writes_headers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let symbols = dir.path().join("cme_ids.txt");
    fs::write(&symbols, "ESZ5,7,1,25\n").expect("symbols");
    let capture_path = dir.path().join("empty.erf");
    fs::write(&capture_path, b"").expect("capture");

    let config = RunConfig {
        capture: capture_path,
        sweeps: dir.path().join("sweeps.csv"),
        icebergs: dir.path().join("icebergs.csv"),
        stops: dir.path().join("stops.csv"),
        symbols,
        min_sweep_depth: 0,
    };
    let stats = run(&config).expect("run");
    assert_eq!(stats.packets, 0);

    let sweeps = fs::read_to_string(&config.sweeps).expect("sweeps csv");
    assert_eq!(sweeps, "ts,symbol,start_price,end_price,total_traded,aggr_side\n");
    let stops = fs::read_to_string(&config.stops).expect("stops csv");
    assert_eq!(
        stops,
        "ts,exchange_ts,symbol,order_id,trigger_price,order_size,traded_size,side\n"
    );
}

#[test]
fn test_missing_symbol_file_aborts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let capture_path = dir.path().join("session.erf");
    fs::write(&capture_path, b"").expect("capture");

    let config = RunConfig {
        capture: capture_path,
        sweeps: dir.path().join("sweeps.csv"),
        icebergs: dir.path().join("icebergs.csv"),
        stops: dir.path().join("stops.csv"),
        symbols: dir.path().join("missing_ids.txt"),
        min_sweep_depth: 0,
    };
    assert!(run(&config).is_err());
}
