//! Static routing: pick the first route whose network contains the destination.

use std::fmt;
use thiserror::Error;
use crate::ip::IpAddress;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("No route found for {0}")]
    NoRouteFound(IpAddress),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    destination: IpAddress,
    netmask: IpAddress,
    gateway: IpAddress, // Unspecified for directly connected networks
}

impl Route {
    pub fn new(destination: IpAddress, netmask: IpAddress, gateway: IpAddress) -> Self {
        Route { destination, netmask, gateway }
    }

    pub fn destination(&self) -> IpAddress {
        self.destination
    }

    pub fn netmask(&self) -> IpAddress {
        self.netmask
    }

    pub fn gateway(&self) -> IpAddress {
        self.gateway
    }

    /// No gateway: the destination is on the link.
    pub fn is_direct(&self) -> bool {
        self.gateway.as_bytes().iter().all(|&b| b == 0)
    }

    /// Same family, and equal after masking both sides.
    pub fn matches(&self, addr: &IpAddress) -> bool {
        addr.family() == self.destination.family()
            && self.destination.mask(&self.netmask).is_some()
            && self.destination.mask(&self.netmask) == addr.mask(&self.netmask)
    }

    /// Where to send a packet for `dst`: the gateway, or `dst` itself on a direct route.
    pub fn next_hop(&self, dst: IpAddress) -> IpAddress {
        if self.is_direct() {
            dst
        } else {
            self.gateway
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} via {}", self.destination, self.netmask, self.gateway)
    }
}

/// Routes in insertion order. Lookup is first match, not longest prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn find_route(&self, dst: &IpAddress) -> Result<&Route, RouteError> {
        self.routes
            .iter()
            .find(|route| route.matches(dst))
            .ok_or(RouteError::NoRouteFound(*dst))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// -- Unit tests --
