pub mod udp_header;

pub use udp_header::{UdpDatagram, UDP_HEADER_LEN};
