//! Capture-file input: ERF record framing, Ethernet/IPv4/UDP stripping,
//! and the MDP 3.0 wire layouts.

mod erf;
mod frame;
mod sbe;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use erf::{ERF_HEADER_LEN, ErfHeader, ErfReader, ErfRecord};
pub use frame::{ETHERTYPE_IPV4, EtherHeader, Ipv4Header, UdpHeader, udp_payload};
pub use sbe::{
    BOOK_ENTRY_LEN, BookAction, BookEntry, EVENT_HEADER_LEN, EventHeader, Indicator,
    MESSAGE_HEADER_LEN, MessageHeader, ORDER_ENTRY_LEN, OrderEntry, OrderGroupHeader,
    PacketHeader, TEMPLATE_ADMIN_HEARTBEAT, TEMPLATE_BOOK_REFRESH, TEMPLATE_ORDER_BOOK_REFRESH,
    TEMPLATE_TRADE_SUMMARY, TRADE_ENTRY_LEN, TradeEntry, entry_type,
};

/// Failures while acquiring or reading the capture file.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The capture file could not be opened.
    #[error("opening capture {path}: {source}")]
    Open {
        /// Capture file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A read from the capture file failed.
    #[error("reading capture {path}: {source}")]
    Read {
        /// Capture file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
