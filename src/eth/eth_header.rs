use crate::eth::mac_addr::MacAddr;
use crate::packet::PacketError;

/// Length of the fixed Ethernet II header.
pub const ETH_HEADER_LEN: usize = 14;

/// An Ethernet II frame: dst MAC, src MAC, ethertype, payload. No FCS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    pub ethertype: u16,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(dst_mac: MacAddr, src_mac: MacAddr, ethertype: u16, payload: Vec<u8>) -> Self {
        EthernetFrame { dst_mac, src_mac, ethertype, payload }
    }

    /// Serialized length: 14 + payload.
    pub fn len(&self) -> usize {
        ETH_HEADER_LEN + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Serialize the frame into a new byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.len()];
        buf[0..6].copy_from_slice(&self.dst_mac.octets());
        buf[6..12].copy_from_slice(&self.src_mac.octets());
        buf[12..14].copy_from_slice(&self.ethertype.to_be_bytes());
        buf[ETH_HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a frame. Everything after the 14-byte header is payload.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < ETH_HEADER_LEN {
            return Err(PacketError::truncated("Ethernet", ETH_HEADER_LEN, buf.len()));
        }

        let mut dst = [0u8; 6];
        let mut src = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);

        Ok(EthernetFrame {
            dst_mac: MacAddr(dst),
            src_mac: MacAddr(src),
            ethertype: u16::from_be_bytes([buf[12], buf[13]]),
            payload: buf[ETH_HEADER_LEN..].to_vec(),
        })
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::ethertype;
    use crate::packet::test_utils;

    fn sample_frame(payload: Vec<u8>) -> EthernetFrame {
        EthernetFrame::new(
            MacAddr::BROADCAST,
            MacAddr::new(0x00, 0x0c, 0x29, 0x36, 0xbc, 0x17),
            ethertype::IPV4,
            payload,
        )
    }

    #[test]
    fn test_frame_to_bytes() {
        let ip_bytes = hex::decode(test_utils::get_ip_hex()).unwrap();
        let bytes = sample_frame(ip_bytes.clone()).encode();

        assert_eq!(bytes.len(), 14 + ip_bytes.len());
        assert_eq!(hex::encode(&bytes[..14]), "ffffffffffff000c2936bc170800");
        assert_eq!(&bytes[14..], ip_bytes.as_slice());
    }

    #[test]
    fn test_frame_from_bytes() {
        let raw = hex::decode(format!("ffffffffffff000c2936bc170800{}", test_utils::get_ip_hex())).unwrap();
        let frame = EthernetFrame::decode(&raw).unwrap();

        assert_eq!(frame.dst_mac, MacAddr::BROADCAST);
        assert_eq!(frame.src_mac.to_string(), "00:0c:29:36:bc:17");
        assert_eq!(frame.ethertype, ethertype::IPV4);
        assert_eq!(frame.payload, hex::decode(test_utils::get_ip_hex()).unwrap());
        assert_eq!(frame.encode(), raw);
    }

    #[test]
    fn test_empty_payload() {
        let frame = sample_frame(vec![]);
        let bytes = frame.encode();
        assert_eq!(bytes.len(), ETH_HEADER_LEN);
        assert_eq!(EthernetFrame::decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        for len in 0..ETH_HEADER_LEN {
            let err = EthernetFrame::decode(&vec![0u8; len]).unwrap_err();
            assert_eq!(err, PacketError::Malformed { layer: "Ethernet", expected: 14, found: len });
        }
    }
}
