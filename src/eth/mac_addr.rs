use std::fmt;
use std::str::FromStr;
use crate::packet::PacketError;

/// A 6-byte link-layer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        MacAddr([a, b, c, d, e, f])
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Parse the colon (or dash) separated form, e.g. `00:0c:29:36:bc:17`.
impl FromStr for MacAddr {
    type Err = PacketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PacketError::BadLength { layer: "Ethernet", field: "MAC address", value: s.len() };
        let mut octets = [0u8; 6];
        let mut parts = s.split([':', '-']);
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddr(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let mac = MacAddr::new(0x00, 0x0c, 0x29, 0x36, 0xbc, 0x17);
        assert_eq!(mac.to_string(), "00:0c:29:36:bc:17");
        assert_eq!("00:0c:29:36:bc:17".parse::<MacAddr>().unwrap(), mac);
        assert_eq!("00-0C-29-36-BC-17".parse::<MacAddr>().unwrap(), mac);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("00:0c:29:36:bc".parse::<MacAddr>().is_err());
        assert!("00:0c:29:36:bc:17:01".parse::<MacAddr>().is_err());
        assert!("00:0c:29:36:bc:zz".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_broadcast() {
        assert!(MacAddr::BROADCAST.is_broadcast());
        assert!(!MacAddr::default().is_broadcast());
    }
}
