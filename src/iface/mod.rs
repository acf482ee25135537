pub mod interface;

pub use interface::{Interface, InterfaceError};

use crate::eth::MacAddr;
use crate::ip::IpAddress;

/// Local link and network identity for a connection.
pub trait EndpointProvider {
    fn mac(&self) -> MacAddr;
    fn ip(&self) -> Option<IpAddress>;
    fn netmask(&self) -> Option<IpAddress>;
    fn gateway(&self) -> Option<IpAddress>;
    fn dns_servers(&self) -> &[IpAddress];
    fn mtu(&self) -> usize;
}
