//! Internet checksum (RFC 1071): 16-bit one's-complement sum of big-endian words.
//!
//! Every codec serializes its header into bytes first and checksums those bytes;
//! nothing here looks at a struct's in-memory layout.

use std::net::Ipv4Addr;

/// A running one's-complement sum.
///
/// Feed it byte spans and 16-bit words, then call [`Checksum::finish`]. An odd
/// trailing byte is padded with zero, so only the last span may have odd length.
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksum {
    sum: u64,
}

impl Checksum {
    pub fn new() -> Self {
        Checksum { sum: 0 }
    }

    pub fn add_u16(&mut self, word: u16) -> &mut Self {
        self.sum += u64::from(word);
        self
    }

    pub fn add_bytes(&mut self, data: &[u8]) -> &mut Self {
        let mut chunks = data.chunks_exact(2);
        for chunk in &mut chunks {
            self.sum += u64::from(u16::from_be_bytes([chunk[0], chunk[1]]));
        }
        if let [last] = chunks.remainder() {
            self.sum += u64::from(*last) << 8;
        }
        self
    }

    /// Add the 12-byte TCP/UDP pseudo-header: src, dst, zero, protocol, length.
    pub fn add_pseudo_header(&mut self, src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, length: u16) -> &mut Self {
        self.add_bytes(&src.octets())
            .add_bytes(&dst.octets())
            .add_u16(u16::from(protocol))
            .add_u16(length)
    }

    /// Fold the carries back in and return the complement.
    pub fn finish(&self) -> u16 {
        let mut sum = self.sum;
        while sum >> 16 != 0 {
            sum = (sum & 0xffff) + (sum >> 16);
        }
        !(sum as u16)
    }
}

/// Checksum of a single byte span. The empty span yields `0xffff`.
pub fn checksum(data: &[u8]) -> u16 {
    Checksum::new().add_bytes(data).finish()
}

/// Checksum of a transport segment prefixed by its IPv4 pseudo-header.
///
/// The caller guarantees `segment.len()` fits the 16-bit length field.
pub fn pseudo_checksum(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, segment: &[u8]) -> u16 {
    Checksum::new()
        .add_pseudo_header(src, dst, protocol, segment.len() as u16)
        .add_bytes(segment)
        .finish()
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::test_utils;

    #[test]
    fn test_empty_span() {
        assert_eq!(checksum(&[]), 0xffff);
    }

    #[test]
    fn test_rfc1071_example() {
        let data = hex::decode("0001f203f4f5f6f7").unwrap();
        assert_eq!(checksum(&data), 0x220d);
    }

    #[test]
    fn test_odd_length_pads_with_zero() {
        assert_eq!(checksum(&[0x01]), 0xfeff);
        assert_eq!(checksum(&[0x01, 0x00]), checksum(&[0x01]));
    }

    #[test]
    fn test_carry_is_folded() {
        // 0xffff + 0xffff = 0x1fffe -> 0xffff -> complement 0x0000
        assert_eq!(checksum(&[0xff, 0xff, 0xff, 0xff]), 0x0000);
    }

    #[test]
    fn test_wireshark_ip_header_sums_to_zero() {
        let ip_bytes = hex::decode(test_utils::get_ip_hex()).unwrap();
        assert_eq!(checksum(&ip_bytes), 0);
    }

    #[test]
    fn test_wireshark_tcp_segment_with_pseudo_header() {
        let tcp_bytes = hex::decode(test_utils::get_tcp_hex()).unwrap();
        let src = Ipv4Addr::new(10, 110, 208, 106);
        let dst = Ipv4Addr::new(204, 44, 192, 60);
        assert_eq!(pseudo_checksum(src, dst, 6, &tcp_bytes), 0);

        // Swapping the addresses keeps the sum, changing the protocol does not
        assert_eq!(pseudo_checksum(dst, src, 6, &tcp_bytes), 0);
        assert_ne!(pseudo_checksum(src, dst, 17, &tcp_bytes), 0);
    }

    #[test]
    fn test_running_sum_matches_single_span() {
        let data = hex::decode(test_utils::get_tcp_hex()).unwrap();
        let mut running = Checksum::new();
        running.add_bytes(&data[..20]).add_bytes(&data[20..]);
        assert_eq!(running.finish(), checksum(&data));
    }
}
