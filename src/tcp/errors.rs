use thiserror::Error;
use crate::packet::PacketError;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum TcpError {
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError), // Wrapper around PacketError

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError), // The sink refused or failed to send

    #[error("Payload of {len} bytes exceeds the MSS of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Interface has no IPv4 address")]
    NoLocalAddress,
}
