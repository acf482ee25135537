use std::net::Ipv4Addr;
use crate::ip::ip_flags::IpFlags;
use crate::packet::{checksum, PacketError};

/// Length of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

/// Version 4, IHL 5: the only header shape this codec speaks.
const VERSION_IHL: u8 = 0x45;

const DEFAULT_TTL: u8 = 64;

/// An IPv4 packet with a fixed 20-byte header (no options).
///
/// Fields are kept in host order; [`Ipv4Packet::encode`] and
/// [`Ipv4Packet::decode`] are the only places that touch wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    pub dscp_ecn: u8,
    pub total_len: u16, // Rewritten as 20 + payload on encode
    pub id: u16,
    pub flags: IpFlags,   // 3 bits, part of u16
    pub frag_offset: u16, // 13 bits, part of u16
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16, // Rewritten on encode
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Build a packet with the stack's defaults: DF set, TTL 64, id 0.
    ///
    /// `total_len` and `checksum` are filled in so the value is already
    /// consistent with what `encode` will write.
    pub fn new(protocol: u8, src_ip: Ipv4Addr, dst_ip: Ipv4Addr, payload: Vec<u8>) -> Self {
        let mut packet = Ipv4Packet {
            dscp_ecn: 0,
            total_len: 0,
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: DEFAULT_TTL,
            protocol,
            checksum: 0,
            src_ip,
            dst_ip,
            payload,
        };
        packet.total_len = (IPV4_HEADER_LEN + packet.payload.len()).min(u16::MAX as usize) as u16;
        packet.checksum = packet.compute_checksum();
        packet
    }

    /// Serialize header and payload. Fails only if the payload does not fit
    /// the 16-bit total length field.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let total_len = IPV4_HEADER_LEN + self.payload.len();
        if total_len > u16::MAX as usize {
            return Err(PacketError::BadLength { layer: "IPv4", field: "total length", value: total_len });
        }

        let mut header = self.header_bytes(total_len as u16);
        let checksum = checksum(&header);
        header[10..12].copy_from_slice(&checksum.to_be_bytes());

        let mut buf = Vec::with_capacity(total_len);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Parse a packet. The payload is bounded by `total_len`, so trailing
    /// link-layer padding is dropped. The checksum is not verified here.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < IPV4_HEADER_LEN {
            return Err(PacketError::truncated("IPv4", IPV4_HEADER_LEN, buf.len()));
        }

        let version = buf[0] >> 4;
        if version != 4 {
            return Err(PacketError::Unsupported { layer: "IPv4", field: "version", value: version.into() });
        }

        let header_len = (buf[0] & 0x0f) as usize * 4;
        if header_len < IPV4_HEADER_LEN {
            return Err(PacketError::BadLength { layer: "IPv4", field: "header length", value: header_len });
        }
        if header_len > IPV4_HEADER_LEN {
            return Err(PacketError::Unsupported { layer: "IPv4", field: "options length", value: (header_len - IPV4_HEADER_LEN) as u32 });
        }

        let total_len = u16::from_be_bytes([buf[2], buf[3]]);
        if (total_len as usize) < IPV4_HEADER_LEN || total_len as usize > buf.len() {
            return Err(PacketError::BadLength { layer: "IPv4", field: "total length", value: total_len as usize });
        }

        let (flags, frag_offset) = IpFlags::unpack(u16::from_be_bytes([buf[6], buf[7]]));

        Ok(Ipv4Packet {
            dscp_ecn: buf[1],
            total_len,
            id: u16::from_be_bytes([buf[4], buf[5]]),
            flags,
            frag_offset,
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            src_ip: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            dst_ip: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
            payload: buf[IPV4_HEADER_LEN..total_len as usize].to_vec(),
        })
    }

    /// Header checksum as it should be for the current field values.
    pub fn compute_checksum(&self) -> u16 {
        checksum(&self.header_bytes(self.total_len))
    }

    /// Explicit checksum check for callers that want strict validation.
    pub fn verify_checksum(&self) -> Result<(), PacketError> {
        let expected = self.compute_checksum();
        if expected != self.checksum {
            return Err(PacketError::ChecksumMismatch { layer: "IPv4", expected, found: self.checksum });
        }
        Ok(())
    }

    /// Header bytes with the checksum field zeroed.
    fn header_bytes(&self, total_len: u16) -> [u8; IPV4_HEADER_LEN] {
        let mut buf = [0u8; IPV4_HEADER_LEN];
        buf[0] = VERSION_IHL;
        buf[1] = self.dscp_ecn;
        buf[2..4].copy_from_slice(&total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags.pack(self.frag_offset).to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        buf[12..16].copy_from_slice(&self.src_ip.octets());
        buf[16..20].copy_from_slice(&self.dst_ip.octets());
        buf
    }
}

// -- Unit tests --
