pub mod eth_header;
pub mod mac_addr;

pub use eth_header::{EthernetFrame, ETH_HEADER_LEN};
pub use mac_addr::MacAddr;

/// Ethertype values used by the stack.
pub mod ethertype {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const IPV6: u16 = 0x86dd;
}
