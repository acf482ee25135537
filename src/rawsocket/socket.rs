use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::os::fd::{AsRawFd, OwnedFd};
use nix::errno::Errno;
use nix::sys::socket::{sendto, setsockopt, socket, AddressFamily, MsgFlags, SockFlag, SockProtocol, SockType, SockaddrIn};
use nix::sys::socket::sockopt::ReuseAddr;
use tracing::trace;
use crate::eth::{ethertype, EthernetFrame};
use crate::ip::Ipv4Packet;
use crate::transport::{TransportError, TransportSink};

/// Raw IPv4 send socket. The kernel expects us to supply the IP header.
pub fn new_send_socket() -> Result<OwnedFd, Errno> {
    let sock_fd = socket(AddressFamily::Inet, SockType::Raw, SockFlag::empty(), SockProtocol::Raw)?;
    setsockopt(&sock_fd, ReuseAddr, &true)?;
    Ok(sock_fd)
}

/// Sends frames through a raw IP socket.
///
/// The kernel builds the link layer itself, so the Ethernet header is stripped
/// and the IPv4 packet is sent to its own destination address. Needs
/// CAP_NET_RAW.
#[derive(Debug)]
pub struct RawIpSink {
    fd: OwnedFd,
}

impl RawIpSink {
    pub fn open() -> Result<Self, TransportError> {
        let fd = new_send_socket().map_err(io::Error::from)?;
        Ok(RawIpSink { fd })
    }
}

impl TransportSink for RawIpSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        let (dst_ip, packet) = strip_link_layer(frame)?;
        let addr = SockaddrIn::from(SocketAddrV4::new(dst_ip, 0));
        let sent = sendto(self.fd.as_raw_fd(), &packet, &addr, MsgFlags::empty()).map_err(io::Error::from)?;
        trace!(dst = %dst_ip, len = sent, "sent raw packet");
        Ok(())
    }
}

/// The IPv4 packet inside `frame` and its destination.
fn strip_link_layer(frame: &[u8]) -> Result<(Ipv4Addr, Vec<u8>), TransportError> {
    let eth = EthernetFrame::decode(frame).map_err(|e| TransportError::Rejected(e.to_string()))?;
    if eth.ethertype != ethertype::IPV4 {
        return Err(TransportError::Rejected(format!("unsupported ethertype {:#06x}", eth.ethertype)));
    }
    let packet = Ipv4Packet::decode(&eth.payload).map_err(|e| TransportError::Rejected(e.to_string()))?;
    Ok((packet.dst_ip, eth.payload))
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::MacAddr;
    use crate::packet::test_utils;

    #[test]
    fn test_strip_link_layer() {
        let mut ip_bytes = hex::decode(test_utils::get_ip_hex()).unwrap();
        ip_bytes.extend(hex::decode(test_utils::get_tcp_hex()).unwrap());
        let frame = EthernetFrame::new(MacAddr::BROADCAST, MacAddr::default(), ethertype::IPV4, ip_bytes.clone()).encode();

        let (dst, packet) = strip_link_layer(&frame).unwrap();
        assert_eq!(dst, Ipv4Addr::new(204, 44, 192, 60));
        assert_eq!(packet, ip_bytes);
    }

    #[test]
    fn test_rejects_non_ipv4() {
        let frame = EthernetFrame::new(MacAddr::BROADCAST, MacAddr::default(), ethertype::ARP, vec![0; 28]).encode();
        assert!(matches!(strip_link_layer(&frame), Err(TransportError::Rejected(_))));
        assert!(matches!(strip_link_layer(&[0u8; 6]), Err(TransportError::Rejected(_))));
    }
}
