pub mod icmp;
pub mod ip_addr;
pub mod ip_flags;
pub mod ip_header;

pub use icmp::{IcmpEcho, IcmpKind};
pub use ip_addr::{IpAddress, IpFamily};
pub use ip_flags::IpFlags;
pub use ip_header::{Ipv4Packet, IPV4_HEADER_LEN};
