use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use thiserror::Error;
use tracing::debug;
use crate::eth::MacAddr;
use crate::iface::EndpointProvider;
use crate::ip::IpAddress;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("Failed to list network interfaces: {0}")]
    Lookup(String),

    #[error("No matching network interface")]
    NotFound,
}

/// A named network interface and the addresses configured on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    name: String,
    mac: MacAddr,
    ip: Option<IpAddress>,
    netmask: Option<IpAddress>,
    gateway: Option<IpAddress>,
    dns_servers: Vec<IpAddress>,
    mtu: usize,
}

impl Interface {
    pub const DEFAULT_MTU: usize = 1500;

    pub fn new(name: impl Into<String>) -> Self {
        Interface {
            name: name.into(),
            mac: MacAddr::default(),
            ip: None,
            netmask: None,
            gateway: None,
            dns_servers: Vec::new(),
            mtu: Self::DEFAULT_MTU,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_mac(&mut self, mac: MacAddr) -> &mut Self {
        self.mac = mac;
        self
    }

    pub fn set_ip(&mut self, ip: IpAddress) -> &mut Self {
        self.ip = Some(ip);
        self
    }

    pub fn set_netmask(&mut self, netmask: IpAddress) -> &mut Self {
        self.netmask = Some(netmask);
        self
    }

    pub fn set_gateway(&mut self, gateway: IpAddress) -> &mut Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn add_dns_server(&mut self, server: IpAddress) -> &mut Self {
        self.dns_servers.push(server);
        self
    }

    pub fn set_mtu(&mut self, mtu: usize) -> &mut Self {
        self.mtu = mtu;
        self
    }

    /// Whether `addr` sits on this interface's subnet.
    pub fn is_local(&self, addr: &IpAddress) -> bool {
        match (self.ip, self.netmask) {
            (Some(ip), Some(mask)) => ip.mask(&mask).is_some() && ip.mask(&mask) == addr.mask(&mask),
            _ => false,
        }
    }

    /// Read the interface called `name` from the host.
    pub fn lookup(name: &str) -> Result<Self, InterfaceError> {
        Self::system_interfaces()?
            .iter()
            .find(|iface| iface.name == name)
            .map(Self::from_system)
            .ok_or(InterfaceError::NotFound)
    }

    /// The first interface with a non-loopback IPv4 address.
    pub fn first_non_loopback() -> Result<Self, InterfaceError> {
        Self::system_interfaces()?
            .iter()
            .find(|iface| {
                iface.addr.iter().any(|addr| matches!(addr, Addr::V4(v4) if !v4.ip.is_loopback()))
            })
            .map(Self::from_system)
            .ok_or(InterfaceError::NotFound)
    }

    fn system_interfaces() -> Result<Vec<NetworkInterface>, InterfaceError> {
        NetworkInterface::show().map_err(|e| InterfaceError::Lookup(e.to_string()))
    }

    fn from_system(iface: &NetworkInterface) -> Self {
        let mut result = Interface::new(iface.name.clone());
        if let Some(mac) = iface.mac_addr.as_deref().and_then(|s| s.parse().ok()) {
            result.set_mac(mac);
        }
        // Prefer IPv4; the stack only speaks IPv4 on the wire
        let v4 = iface.addr.iter().find_map(|addr| match addr {
            Addr::V4(v4) => Some(v4),
            Addr::V6(_) => None,
        });
        if let Some(v4) = v4 {
            result.set_ip(v4.ip.into());
            if let Some(mask) = v4.netmask {
                result.set_netmask(mask.into());
            }
        }
        debug!(name = %result.name, mac = %result.mac, ip = ?result.ip, "loaded interface");
        result
    }
}

impl EndpointProvider for Interface {
    fn mac(&self) -> MacAddr {
        self.mac
    }

    fn ip(&self) -> Option<IpAddress> {
        self.ip
    }

    fn netmask(&self) -> Option<IpAddress> {
        self.netmask
    }

    fn gateway(&self) -> Option<IpAddress> {
        self.gateway
    }

    fn dns_servers(&self) -> &[IpAddress] {
        &self.dns_servers
    }

    fn mtu(&self) -> usize {
        self.mtu
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    fn eth0() -> Interface {
        let mut iface = Interface::new("eth0");
        iface
            .set_mac(MacAddr::new(0x00, 0x0c, 0x29, 0x36, 0xbc, 0x17))
            .set_ip(IpAddress::v4(192, 168, 0, 101))
            .set_netmask(IpAddress::v4(255, 255, 255, 0))
            .set_gateway(IpAddress::v4(192, 168, 0, 1))
            .add_dns_server(IpAddress::v4(8, 8, 8, 8));
        iface
    }

    #[test]
    fn test_endpoint_provider() {
        let iface = eth0();
        assert_eq!(iface.name(), "eth0");
        assert_eq!(iface.mac().to_string(), "00:0c:29:36:bc:17");
        assert_eq!(iface.ip(), Some(IpAddress::v4(192, 168, 0, 101)));
        assert_eq!(iface.gateway(), Some(IpAddress::v4(192, 168, 0, 1)));
        assert_eq!(iface.dns_servers(), &[IpAddress::v4(8, 8, 8, 8)]);
        assert_eq!(iface.mtu(), 1500);
    }

    #[test]
    fn test_is_local() {
        let iface = eth0();
        assert!(iface.is_local(&IpAddress::v4(192, 168, 0, 7)));
        assert!(!iface.is_local(&IpAddress::v4(10, 0, 0, 7)));
        assert!(!Interface::new("lo").is_local(&IpAddress::v4(192, 168, 0, 7)));
    }

    #[test]
    fn test_lookup_unknown_interface() {
        assert!(Interface::lookup("no-such-iface0").is_err());
    }
}
