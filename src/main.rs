use std::error::Error;
use std::net::SocketAddrV4;
use netstack::eth::{EthernetFrame, MacAddr};
use netstack::iface::{EndpointProvider, Interface};
use netstack::ip::{IcmpEcho, IpAddress, Ipv4Packet};
use netstack::route::{Route, RoutingTable};
use netstack::tcp::{TcpConfig, TcpConnection, TcpFlags, TcpHeader, Wrap32};
use netstack::transport::MemorySink;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Host setup
    let mut iface = Interface::new("eth0");
    iface
        .set_mac("00:0c:29:36:bc:17".parse()?)
        .set_ip("192.168.0.101".parse()?)
        .set_netmask("255.255.255.0".parse()?)
        .set_gateway("192.168.0.1".parse()?)
        .add_dns_server("8.8.8.8".parse()?);
    info!(name = iface.name(), mac = %iface.mac(), mtu = iface.mtu(), "interface up");

    let mut routes = RoutingTable::new();
    routes.add_route(Route::new("192.168.0.0".parse()?, "255.255.255.0".parse()?, IpAddress::UNSPECIFIED_V4));
    routes.add_route(Route::new(IpAddress::UNSPECIFIED_V4, IpAddress::UNSPECIFIED_V4, "192.168.0.1".parse()?));

    let server: IpAddress = "192.168.0.1".parse()?;
    let route = routes.find_route(&server)?;
    info!(%route, next_hop = %route.next_hop(server), "route selected");

    // Handshake and active close against a scripted peer
    let remote = SocketAddrV4::new("192.168.0.1".parse()?, 80);
    let mut sink = MemorySink::new();
    {
        let mut conn =
            TcpConnection::from_interface(&iface, 12345, remote, MacAddr::BROADCAST, TcpConfig::default(), &mut sink)?;
        conn.send_syn()?;
        conn.on_segment(&TcpHeader::new(80, 12345, Wrap32::new(0), Wrap32::new(1), TcpFlags::SYN | TcpFlags::ACK))?;
        info!(state = %conn.state(), "handshake complete");

        conn.send_data(b"GET / HTTP/1.0\r\n\r\n")?;
        conn.send_fin()?;
        let fin_ack = conn.seq_no();
        conn.on_segment(&TcpHeader::new(80, 12345, Wrap32::new(1), fin_ack, TcpFlags::ACK))?;
        conn.on_segment(&TcpHeader::new(80, 12345, Wrap32::new(1), fin_ack, TcpFlags::FIN | TcpFlags::ACK))?;
        info!(state = %conn.state(), ignored = conn.ignored_events(), "teardown complete");
    }

    for (i, frame) in sink.frames().iter().enumerate() {
        let eth = EthernetFrame::decode(frame)?;
        let ip = Ipv4Packet::decode(&eth.payload)?;
        let tcp = TcpHeader::decode(&ip.payload)?;
        info!(
            frame = i,
            flags = ?tcp.flags,
            seq = %tcp.seq_no,
            ack = %tcp.ack_no,
            bytes = %hex::encode(frame),
            "captured"
        );
    }

    // ICMP echo
    let request = IcmpEcho::request(1, 1);
    let reply = request.to_reply();
    info!(request = %hex::encode(request.encode()), reply = %hex::encode(reply.encode()), "icmp echo");

    Ok(())
}
