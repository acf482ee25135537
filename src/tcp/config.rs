use std::time::Duration;
use rand::Rng;
use crate::tcp::retransmit::RetransmitPolicy;
use crate::tcp::tcp_header::{DEFAULT_WINDOW, TCP_HEADER_LEN};
use crate::ip::IPV4_HEADER_LEN;

/// Knobs for a single connection. `Default` gives the classic settings:
/// ISN 0, a 3 second retransmission timeout and a 1500 byte MTU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Retransmission timeout.
    pub rto: Duration,
    /// Maximum segment lifetime; TIME_WAIT lasts twice this.
    pub msl: Duration,
    /// Initial sequence number.
    pub isn: u32,
    pub window: u16,
    pub ttl: u8,
    pub mtu: usize,
    pub retransmit: RetransmitPolicy,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            rto: Duration::from_secs(3),
            msl: Duration::from_secs(30),
            isn: 0,
            window: DEFAULT_WINDOW,
            ttl: 64,
            mtu: 1500,
            retransmit: RetransmitPolicy::default(),
        }
    }
}

impl TcpConfig {
    /// Same settings with a random initial sequence number.
    pub fn with_random_isn(mut self) -> Self {
        self.isn = rand::thread_rng().gen();
        self
    }

    /// Largest payload that fits one frame: MTU minus IPv4 and TCP headers.
    pub fn mss(&self) -> usize {
        self.mtu.saturating_sub(IPV4_HEADER_LEN + TCP_HEADER_LEN)
    }

    pub fn time_wait(&self) -> Duration {
        self.msl * 2
    }
}

/// Pick a port from the dynamic range (49152..=65535).
pub fn ephemeral_port() -> u16 {
    rand::thread_rng().gen_range(49152..=65535)
}

// -- Unit tests --
