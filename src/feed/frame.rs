//! Ethernet/IPv4/UDP header stripping for captured frames.
//!
//! Only plain IPv4-over-Ethernet frames are processed; IP options are not
//! parsed (the feed's frames carry none) and anything else is skipped by
//! returning `None`.

use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// EtherType for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

const UDP_HEADER_LEN: usize = 8;

/// Ethernet II header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct EtherHeader {
    /// Destination MAC.
    pub dest: [u8; 6],
    /// Source MAC.
    pub src: [u8; 6],
    /// EtherType, network byte order.
    pub ether_type: U16<BigEndian>,
}

/// IPv4 header without options.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Ipv4Header {
    /// Version and header length nibbles.
    pub version_ihl: u8,
    /// Type of service.
    pub tos: u8,
    /// Total datagram length.
    pub total_len: U16<BigEndian>,
    /// Identification.
    pub ident: U16<BigEndian>,
    /// Flags and fragment offset.
    pub frag_off: U16<BigEndian>,
    /// Time to live.
    pub ttl: u8,
    /// Transport protocol.
    pub protocol: u8,
    /// Header checksum.
    pub checksum: U16<BigEndian>,
    /// Source address.
    pub source: U32<BigEndian>,
    /// Destination address.
    pub dest: U32<BigEndian>,
}

/// UDP header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct UdpHeader {
    /// Source port.
    pub source_port: U16<BigEndian>,
    /// Destination port.
    pub dest_port: U16<BigEndian>,
    /// Datagram length including this header.
    pub length: U16<BigEndian>,
    /// Checksum.
    pub checksum: U16<BigEndian>,
}

/// Strip the Ethernet/IPv4/UDP envelope and return the UDP payload, bounded
/// by the UDP length field. Returns `None` for non-IPv4 frames and frames
/// too short to carry the three headers.
pub fn udp_payload(frame: &[u8]) -> Option<&[u8]> {
    let (eth, rest) = EtherHeader::ref_from_prefix(frame).ok()?;
    if eth.ether_type.get() != ETHERTYPE_IPV4 {
        return None;
    }
    let (_ip, rest) = Ipv4Header::ref_from_prefix(rest).ok()?;
    let (udp, rest) = UdpHeader::ref_from_prefix(rest).ok()?;
    let payload_len = (udp.length.get() as usize).checked_sub(UDP_HEADER_LEN)?;
    Some(&rest[..payload_len.min(rest.len())])
}
