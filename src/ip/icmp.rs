use crate::packet::{checksum, PacketError};

pub const ICMP_HEADER_LEN: usize = 8;

/// The two ICMP message types the stack understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpKind {
    EchoReply = 0,
    EchoRequest = 8,
}

impl TryFrom<u8> for IcmpKind {
    type Error = PacketError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IcmpKind::EchoReply),
            8 => Ok(IcmpKind::EchoRequest),
            other => Err(PacketError::Unsupported { layer: "ICMP", field: "type", value: other.into() }),
        }
    }
}

/// ICMP echo request/reply: type, code, checksum, identifier, sequence, data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpEcho {
    pub kind: IcmpKind,
    pub code: u8,
    pub checksum: u16, // Rewritten on encode
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
}

impl IcmpEcho {
    pub fn request(identifier: u16, sequence: u16) -> Self {
        Self::build(IcmpKind::EchoRequest, identifier, sequence, vec![])
    }

    pub fn reply(identifier: u16, sequence: u16) -> Self {
        Self::build(IcmpKind::EchoReply, identifier, sequence, vec![])
    }

    /// Answer an echo request: same identifier, sequence and data.
    pub fn to_reply(&self) -> Self {
        Self::build(IcmpKind::EchoReply, self.identifier, self.sequence, self.payload.clone())
    }

    fn build(kind: IcmpKind, identifier: u16, sequence: u16, payload: Vec<u8>) -> Self {
        let mut echo = IcmpEcho { kind, code: 0, checksum: 0, identifier, sequence, payload };
        echo.checksum = echo.compute_checksum();
        echo
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.bytes_without_checksum();
        let checksum = checksum(&buf);
        buf[2..4].copy_from_slice(&checksum.to_be_bytes());
        buf
    }

    /// Parse an echo message. Other ICMP types are reported as unsupported.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < ICMP_HEADER_LEN {
            return Err(PacketError::truncated("ICMP", ICMP_HEADER_LEN, buf.len()));
        }

        Ok(IcmpEcho {
            kind: IcmpKind::try_from(buf[0])?,
            code: buf[1],
            checksum: u16::from_be_bytes([buf[2], buf[3]]),
            identifier: u16::from_be_bytes([buf[4], buf[5]]),
            sequence: u16::from_be_bytes([buf[6], buf[7]]),
            payload: buf[ICMP_HEADER_LEN..].to_vec(),
        })
    }

    pub fn compute_checksum(&self) -> u16 {
        checksum(&self.bytes_without_checksum())
    }

    pub fn verify_checksum(&self) -> Result<(), PacketError> {
        let expected = self.compute_checksum();
        if expected != self.checksum {
            return Err(PacketError::ChecksumMismatch { layer: "ICMP", expected, found: self.checksum });
        }
        Ok(())
    }

    fn bytes_without_checksum(&self) -> Vec<u8> {
        let mut buf = vec![0u8; ICMP_HEADER_LEN + self.payload.len()];
        buf[0] = self.kind as u8;
        buf[1] = self.code;
        buf[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        buf[ICMP_HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }
}
