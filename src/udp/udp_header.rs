use std::net::Ipv4Addr;
use crate::packet::{protocol, pseudo_checksum, PacketError};

pub const UDP_HEADER_LEN: usize = 8;

/// A UDP datagram. A checksum of zero means "not computed by the sender".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    pub src_port: u16,
    pub dst_port: u16,
    pub length: u16,   // Rewritten as 8 + payload on encode
    pub checksum: u16, // 0 = unchecked
    pub payload: Vec<u8>,
}

impl UdpDatagram {
    /// New datagram with the length filled in and no checksum.
    pub fn new(src_port: u16, dst_port: u16, payload: Vec<u8>) -> Self {
        let length = (UDP_HEADER_LEN + payload.len()).min(u16::MAX as usize) as u16;
        UdpDatagram { src_port, dst_port, length, checksum: 0, payload }
    }

    /// Serialize with a checksum over the IPv4 pseudo-header.
    pub fn encode(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<Vec<u8>, PacketError> {
        let mut buf = self.bytes_without_checksum()?;
        let checksum = Self::non_zero(pseudo_checksum(src_ip, dst_ip, protocol::UDP, &buf));
        buf[6..8].copy_from_slice(&checksum.to_be_bytes());
        Ok(buf)
    }

    /// Serialize with the checksum field left at zero.
    pub fn encode_unchecked(&self) -> Result<Vec<u8>, PacketError> {
        self.bytes_without_checksum()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < UDP_HEADER_LEN {
            return Err(PacketError::truncated("UDP", UDP_HEADER_LEN, buf.len()));
        }

        let length = u16::from_be_bytes([buf[4], buf[5]]);
        if (length as usize) < UDP_HEADER_LEN || length as usize > buf.len() {
            return Err(PacketError::BadLength { layer: "UDP", field: "length", value: length as usize });
        }

        Ok(UdpDatagram {
            src_port: u16::from_be_bytes([buf[0], buf[1]]),
            dst_port: u16::from_be_bytes([buf[2], buf[3]]),
            length,
            checksum: u16::from_be_bytes([buf[6], buf[7]]),
            payload: buf[UDP_HEADER_LEN..length as usize].to_vec(),
        })
    }

    /// The checksum `encode` would write for these addresses.
    pub fn compute_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<u16, PacketError> {
        let buf = self.bytes_without_checksum()?;
        Ok(Self::non_zero(pseudo_checksum(src_ip, dst_ip, protocol::UDP, &buf)))
    }

    /// Explicit check. A zero checksum always passes.
    pub fn verify_checksum(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Result<(), PacketError> {
        if self.checksum == 0 {
            return Ok(());
        }
        let expected = self.compute_checksum(src_ip, dst_ip)?;
        if expected != self.checksum {
            return Err(PacketError::ChecksumMismatch { layer: "UDP", expected, found: self.checksum });
        }
        Ok(())
    }

    fn bytes_without_checksum(&self) -> Result<Vec<u8>, PacketError> {
        let length = UDP_HEADER_LEN + self.payload.len();
        if length > u16::MAX as usize {
            return Err(PacketError::BadLength { layer: "UDP", field: "length", value: length });
        }

        let mut buf = vec![0u8; length];
        buf[0..2].copy_from_slice(&self.src_port.to_be_bytes());
        buf[2..4].copy_from_slice(&self.dst_port.to_be_bytes());
        buf[4..6].copy_from_slice(&(length as u16).to_be_bytes());
        buf[UDP_HEADER_LEN..].copy_from_slice(&self.payload);
        Ok(buf)
    }

    // A computed zero goes on the wire as all ones (RFC 768)
    fn non_zero(checksum: u16) -> u16 {
        if checksum == 0 {
            0xffff
        } else {
            checksum
        }
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::checksum::Checksum;

    const SRC: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 101);
    const DST: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 1);

    #[test]
    fn test_udp_to_bytes() {
        let datagram = UdpDatagram::new(68, 67, b"abc".to_vec());
        let bytes = datagram.encode_unchecked().unwrap();
        assert_eq!(hex::encode(&bytes), "00440043000b0000616263");
    }

    #[test]
    fn test_checksum_covers_pseudo_header() {
        let datagram = UdpDatagram::new(5353, 53, b"query".to_vec());
        let bytes = datagram.encode(SRC, DST).unwrap();

        let mut sum = Checksum::new();
        sum.add_pseudo_header(SRC, DST, protocol::UDP, bytes.len() as u16).add_bytes(&bytes);
        assert_eq!(sum.finish(), 0);

        let parsed = UdpDatagram::decode(&bytes).unwrap();
        assert!(parsed.verify_checksum(SRC, DST).is_ok());
        assert!(parsed.verify_checksum(SRC, Ipv4Addr::new(10, 0, 0, 1)).is_err());
    }

    #[test]
    fn test_zero_checksum_is_unchecked() {
        let bytes = UdpDatagram::new(1000, 2000, b"hello".to_vec()).encode_unchecked().unwrap();
        let parsed = UdpDatagram::decode(&bytes).unwrap();
        assert_eq!(parsed.checksum, 0);
        assert!(parsed.verify_checksum(SRC, DST).is_ok());
    }

    #[test]
    fn test_round_trip() {
        let mut datagram = UdpDatagram::new(1000, 2000, vec![]);
        assert_eq!(UdpDatagram::decode(&datagram.encode_unchecked().unwrap()).unwrap(), datagram);

        datagram.payload = vec![1, 2, 3];
        datagram.length = 11;
        datagram.checksum = datagram.compute_checksum(SRC, DST).unwrap();
        assert_eq!(UdpDatagram::decode(&datagram.encode(SRC, DST).unwrap()).unwrap(), datagram);
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            UdpDatagram::decode(&[0u8; 7]),
            Err(PacketError::Malformed { layer: "UDP", expected: 8, found: 7 })
        );

        // length field below the header size
        let bytes = hex::decode("0044004300040000").unwrap();
        assert!(UdpDatagram::decode(&bytes).unwrap_err().is_malformed());

        // length field beyond the buffer
        let bytes = hex::decode("00440043000b0000").unwrap();
        assert!(matches!(UdpDatagram::decode(&bytes), Err(PacketError::BadLength { value: 11, .. })));
    }
}
