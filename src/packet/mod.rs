pub mod checksum;
pub mod errors;

pub use checksum::{checksum, pseudo_checksum, Checksum};
pub use errors::PacketError;

/// IANA protocol numbers carried in the IPv4 `protocol` field.
pub mod protocol {
    pub const ICMP: u8 = 1;
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
}

// Unit test helpers

#[cfg(test)]
pub mod test_utils {
    /// IPv4 header of a SYN captured in Wireshark: 10.110.208.106 -> 204.44.192.60
    pub fn get_ip_hex() -> &'static str {
        "45000040000040004006d3760a6ed06acc2cc03c"
    }

    /// The TCP SYN carried by `get_ip_hex`, with 24 bytes of options
    pub fn get_tcp_hex() -> &'static str {
        "c6b70050a4269c9300000000b002ffff92970000020405b4010303060101080abb6879f80000000004020000"
    }
}
