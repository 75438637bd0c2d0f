//! MDP 3.0 wire layouts: the packet header, the per-message framing, and
//! the bodies of the two templates the analyzer consumes (incremental book
//! refresh and trade summary). All multi-byte fields are little-endian.

use bitflags::bitflags;
use zerocopy::byteorder::{I32, I64, LittleEndian, U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Incremental book refresh.
pub const TEMPLATE_BOOK_REFRESH: u16 = 32;
/// Trade summary with order group.
pub const TEMPLATE_TRADE_SUMMARY: u16 = 42;
/// Order-by-order refresh, recognized but not processed.
pub const TEMPLATE_ORDER_BOOK_REFRESH: u16 = 43;
/// Admin heartbeat, recognized but not processed.
pub const TEMPLATE_ADMIN_HEARTBEAT: u16 = 12;

/// Size of [`MessageHeader`].
pub const MESSAGE_HEADER_LEN: usize = 10;
/// Size of [`EventHeader`].
pub const EVENT_HEADER_LEN: usize = 14;
/// Size of [`BookEntry`].
pub const BOOK_ENTRY_LEN: usize = 27;
/// Size of [`TradeEntry`].
pub const TRADE_ENTRY_LEN: usize = 31;
/// Size of [`OrderEntry`]; order entries are packed at this fixed stride.
pub const ORDER_ENTRY_LEN: usize = 16;

bitflags! {
    /// Match-event indicator byte carried by every refresh message. The
    /// dispatcher acts on the trade, quote, and message boundaries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Indicator: u8 {
        /// Last trade-summary message of the match event.
        const LAST_TRADE = 0x01;
        /// Last volume update of the match event.
        const LAST_VOLUME = 0x02;
        /// Last quote update of the match event.
        const LAST_QUOTE = 0x04;
        /// Last statistics update of the match event.
        const LAST_STATS = 0x08;
        /// Last implied-quote update of the match event.
        const LAST_IMPLIED = 0x10;
        /// Last message of the packet.
        const LAST_MSG = 0x80;
    }
}

/// Wire values of the book-entry type byte.
pub mod entry_type {
    /// Outright bid level.
    pub const BID: u8 = b'0';
    /// Outright ask level.
    pub const ASK: u8 = b'1';
    /// Implied bid level.
    pub const IMPLIED_BID: u8 = b'E';
    /// Implied ask level.
    pub const IMPLIED_ASK: u8 = b'F';
}

/// Book maintenance action of a refresh entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookAction {
    /// Insert a level at the given position.
    Add,
    /// Replace the level at the given position.
    Update,
    /// Remove the level at the given position.
    Delete,
    /// Remove every level above the given position.
    DeleteThru,
    /// Remove the given position and everything below it.
    DeleteFrom,
}

impl BookAction {
    /// Decode the wire byte; unknown values yield `None` and the entry is
    /// applied as a no-op edit.
    #[inline]
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(BookAction::Add),
            1 => Some(BookAction::Update),
            2 => Some(BookAction::Delete),
            3 => Some(BookAction::DeleteThru),
            4 => Some(BookAction::DeleteFrom),
            _ => None,
        }
    }
}

/// Channel packet header preceding the first message.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PacketHeader {
    /// Channel sequence number.
    pub seq_num: U32<LittleEndian>,
    /// Sending time, nanoseconds.
    pub send_time: U64<LittleEndian>,
}

/// Per-message framing header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MessageHeader {
    /// Message length including this header.
    pub msg_length: U16<LittleEndian>,
    /// SBE root block length.
    pub block_length: U16<LittleEndian>,
    /// Template discriminator.
    pub template_id: U16<LittleEndian>,
    /// SBE schema id.
    pub schema_id: U16<LittleEndian>,
    /// SBE schema version.
    pub version: U16<LittleEndian>,
}

/// Shared body header of the book-refresh and trade-summary templates:
/// transact time, the indicator byte, and the entry group dimensions.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct EventHeader {
    /// Exchange transact time, nanoseconds.
    pub transact_time: U64<LittleEndian>,
    /// Match-event indicator bits, see [`Indicator`].
    pub indicator: u8,
    /// Alignment padding.
    pub padding: [u8; 2],
    /// On-wire stride of each group entry.
    pub entry_size: U16<LittleEndian>,
    /// Number of group entries.
    pub num_in_group: u8,
}

impl EventHeader {
    /// The indicator byte as typed flags.
    #[inline]
    pub fn indicator(&self) -> Indicator {
        Indicator::from_bits_retain(self.indicator)
    }
}

/// One book-refresh group entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct BookEntry {
    /// Exchange-native fixed-point price.
    pub price: I64<LittleEndian>,
    /// Level quantity.
    pub size: I32<LittleEndian>,
    /// Security id.
    pub sec_id: I32<LittleEndian>,
    /// Per-instrument sequence number.
    pub rpt_seq: U32<LittleEndian>,
    /// Orders at the level.
    pub num_orders: I32<LittleEndian>,
    /// 1-based book position.
    pub price_level: u8,
    /// Book action, see [`BookAction`].
    pub action_type: u8,
    /// Side and outright/implied discriminator, see [`entry_type`].
    pub entry_type: u8,
}

/// One trade-summary group entry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TradeEntry {
    /// Exchange-native fixed-point trade price.
    pub price: I64<LittleEndian>,
    /// Traded quantity.
    pub qty: I32<LittleEndian>,
    /// Security id.
    pub sec_id: I32<LittleEndian>,
    /// Per-instrument sequence number.
    pub rpt_seq: U32<LittleEndian>,
    /// Orders participating in the trade.
    pub num_orders: I32<LittleEndian>,
    /// Aggressor side byte (0 none, 1 buy, 2 sell).
    pub aggressor_side: u8,
    /// Update action, unused by the analyzer.
    pub update_action: u8,
    /// Entry type, unused by the analyzer.
    pub entry_type: u8,
    /// Trade entry id.
    pub entry_id: U32<LittleEndian>,
}

/// Dimension header of the order group trailing a trade summary.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct OrderGroupHeader {
    /// On-wire entry size.
    pub entry_size: U16<LittleEndian>,
    /// Alignment padding.
    pub padding: [u8; 5],
    /// Number of order entries.
    pub num_in_group: u8,
}

/// One order touched by the trade, aggressor first.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct OrderEntry {
    /// Wire order id.
    pub order_id: U64<LittleEndian>,
    /// Quantity this order contributed.
    pub qty: I32<LittleEndian>,
    /// Alignment padding.
    pub padding: [u8; 4],
}
