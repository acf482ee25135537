use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family tag for [`IpAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Number of meaningful bytes for this family.
    pub fn byte_len(self) -> usize {
        match self {
            IpFamily::V4 => 4,
            IpFamily::V6 => 16,
        }
    }
}

/// An IPv4 or IPv6 address stored in a fixed 16-byte buffer.
///
/// The family tag selects how many bytes are meaningful; for IPv4 only the
/// first four are used and the rest stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpAddress {
    family: IpFamily,
    octets: [u8; 16],
}

impl IpAddress {
    pub const UNSPECIFIED_V4: IpAddress = IpAddress { family: IpFamily::V4, octets: [0; 16] };

    pub fn v4(a: u8, b: u8, c: u8, d: u8) -> Self {
        Ipv4Addr::new(a, b, c, d).into()
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    /// The meaningful bytes: 4 for IPv4, 16 for IPv6.
    pub fn as_bytes(&self) -> &[u8] {
        &self.octets[..self.family.byte_len()]
    }

    /// The full backing buffer.
    pub fn octets(&self) -> [u8; 16] {
        self.octets
    }

    pub fn to_ipv4(&self) -> Option<Ipv4Addr> {
        match self.family {
            IpFamily::V4 => Some(Ipv4Addr::new(self.octets[0], self.octets[1], self.octets[2], self.octets[3])),
            IpFamily::V6 => None,
        }
    }

    /// Byte-wise AND with `mask`. `None` when the families differ.
    pub fn mask(&self, mask: &IpAddress) -> Option<IpAddress> {
        if self.family != mask.family {
            return None;
        }
        let mut octets = [0u8; 16];
        for (i, octet) in octets.iter_mut().enumerate().take(self.family.byte_len()) {
            *octet = self.octets[i] & mask.octets[i];
        }
        Some(IpAddress { family: self.family, octets })
    }
}

impl Default for IpAddress {
    fn default() -> Self {
        Self::UNSPECIFIED_V4
    }
}

impl From<Ipv4Addr> for IpAddress {
    fn from(addr: Ipv4Addr) -> Self {
        let mut octets = [0u8; 16];
        octets[..4].copy_from_slice(&addr.octets());
        IpAddress { family: IpFamily::V4, octets }
    }
}

impl From<Ipv6Addr> for IpAddress {
    fn from(addr: Ipv6Addr) -> Self {
        IpAddress { family: IpFamily::V6, octets: addr.octets() }
    }
}

impl From<IpAddr> for IpAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl From<IpAddress> for IpAddr {
    fn from(addr: IpAddress) -> Self {
        match addr.family {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::new(addr.octets[0], addr.octets[1], addr.octets[2], addr.octets[3])),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(addr.octets)),
        }
    }
}

impl FromStr for IpAddress {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(IpAddr::from_str(s)?.into())
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&IpAddr::from(*self), f)
    }
}
