pub mod eth;
pub mod iface;
pub mod ip;
pub mod packet;
pub mod rawsocket;
pub mod route;
pub mod tcp;
pub mod transport;
pub mod udp;
