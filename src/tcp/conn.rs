use std::fmt;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};
use crate::eth::{ethertype, EthernetFrame, MacAddr};
use crate::iface::EndpointProvider;
use crate::ip::Ipv4Packet;
use crate::packet::protocol;
use crate::tcp::config::TcpConfig;
use crate::tcp::errors::TcpError;
use crate::tcp::retransmit::RetransmissionTimer;
use crate::tcp::state::{self, TcpEvent, TcpState, Transition};
use crate::tcp::tcp_flags::TcpFlags;
use crate::tcp::tcp_header::TcpHeader;
use crate::tcp::wrap32::Wrap32;
use crate::transport::TransportSink;

/// Source MAC used until `with_link` says otherwise.
pub const DEFAULT_LOCAL_MAC: MacAddr = MacAddr([0x00, 0x0c, 0x29, 0x36, 0xbc, 0x17]);

/// Where a connection reads the time when it sends or enters TIME_WAIT.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> Instant + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Clock(Arc::new(Instant::now))
    }

    pub fn new(now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        Clock(Arc::new(now))
    }

    pub fn now(&self) -> Instant {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::system()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock")
    }
}

/// One TCP connection between two fixed endpoints.
///
/// Every event method looks the current state up in the transition table. If
/// there is no row, or the segment lacks the flags the event needs, the call is
/// a no-op: nothing is sent, no counter moves, and `ignored_events` goes up.
/// Otherwise the connection emits the row's segment (wrapped in IPv4 and
/// Ethernet and handed to the sink), advances its sequence numbers and
/// changes state. A sink failure is returned before anything is committed.
#[derive(Debug)]
pub struct TcpConnection<S: TransportSink> {
    local: SocketAddrV4,
    remote: SocketAddrV4,
    local_mac: MacAddr,
    remote_mac: MacAddr,
    state: TcpState,
    seq_no: Wrap32, // Next sequence number to send
    ack_no: Wrap32, // Next sequence number expected from the peer
    config: TcpConfig,
    timer: RetransmissionTimer,
    time_wait_since: Option<Instant>,
    ignored_events: u64,
    clock: Clock,
    sink: S,
}

impl<S: TransportSink> TcpConnection<S> {
    pub fn new(local: SocketAddrV4, remote: SocketAddrV4, sink: S) -> Self {
        Self::with_config(TcpConfig::default(), local, remote, sink)
    }

    pub fn with_config(config: TcpConfig, local: SocketAddrV4, remote: SocketAddrV4, sink: S) -> Self {
        TcpConnection {
            local,
            remote,
            local_mac: DEFAULT_LOCAL_MAC,
            remote_mac: MacAddr::BROADCAST,
            state: TcpState::Closed,
            seq_no: Wrap32::new(config.isn),
            ack_no: Wrap32::new(0),
            timer: RetransmissionTimer::new(config.retransmit, config.rto),
            config,
            time_wait_since: None,
            ignored_events: 0,
            clock: Clock::system(),
            sink,
        }
    }

    /// Build a connection whose local address, MAC and MTU come from `provider`.
    pub fn from_interface<P>(
        provider: &P,
        local_port: u16,
        remote: SocketAddrV4,
        remote_mac: MacAddr,
        mut config: TcpConfig,
        sink: S,
    ) -> Result<Self, TcpError>
    where
        P: EndpointProvider + ?Sized,
    {
        let local_ip = provider.ip().and_then(|ip| ip.to_ipv4()).ok_or(TcpError::NoLocalAddress)?;
        config.mtu = provider.mtu();
        let local = SocketAddrV4::new(local_ip, local_port);
        Ok(Self::with_config(config, local, remote, sink).with_link(provider.mac(), remote_mac))
    }

    /// Set the Ethernet addresses written into every frame.
    pub fn with_link(mut self, local_mac: MacAddr, remote_mac: MacAddr) -> Self {
        self.local_mac = local_mac;
        self.remote_mac = remote_mac;
        self
    }

    /// Stamp sends and TIME_WAIT entry from `clock` instead of the system clock.
    /// It must share a time base with the `now` given to `check_timeout`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // -- Accessors --

    pub fn state(&self) -> TcpState {
        self.state
    }

    pub fn seq_no(&self) -> Wrap32 {
        self.seq_no
    }

    pub fn ack_no(&self) -> Wrap32 {
        self.ack_no
    }

    pub fn local(&self) -> SocketAddrV4 {
        self.local
    }

    pub fn remote(&self) -> SocketAddrV4 {
        self.remote
    }

    pub fn config(&self) -> &TcpConfig {
        &self.config
    }

    pub fn mss(&self) -> usize {
        self.config.mss()
    }

    /// Events dropped because the current state had no transition for them.
    pub fn ignored_events(&self) -> u64 {
        self.ignored_events
    }

    /// Frames held for retransmission.
    pub fn pending_retransmits(&self) -> usize {
        self.timer.pending()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // -- Local events --

    /// Passive open.
    pub fn listen(&mut self) -> Result<(), TcpError> {
        match self.lookup(TcpEvent::Listen, true) {
            Some(t) => self.fire(t, self.ack_no, &[]),
            None => Ok(()),
        }
    }

    /// Active open: emit SYN.
    pub fn send_syn(&mut self) -> Result<(), TcpError> {
        match self.lookup(TcpEvent::SendSyn, true) {
            Some(t) => self.fire(t, self.ack_no, &[]),
            None => Ok(()),
        }
    }

    /// Finish a passive open by acknowledging the peer's SYN.
    pub fn send_ack(&mut self) -> Result<(), TcpError> {
        match self.lookup(TcpEvent::SendAck, true) {
            Some(t) => self.fire(t, self.ack_no, &[]),
            None => Ok(()),
        }
    }

    /// Send one PSH|ACK segment. The payload must fit in a single MSS.
    pub fn send_data(&mut self, payload: &[u8]) -> Result<(), TcpError> {
        let Some(t) = self.lookup(TcpEvent::SendData, true) else {
            return Ok(());
        };
        if payload.len() > self.mss() {
            return Err(TcpError::PayloadTooLarge { len: payload.len(), max: self.mss() });
        }
        self.fire(t, self.ack_no, payload)
    }

    /// Close our side: emit FIN.
    pub fn send_fin(&mut self) -> Result<(), TcpError> {
        match self.lookup(TcpEvent::SendFin, true) {
            Some(t) => self.fire(t, self.ack_no, &[]),
            None => Ok(()),
        }
    }

    // -- Inbound segments --

    pub fn receive_syn(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let valid = segment.flags.contains(TcpFlags::SYN);
        match self.lookup(TcpEvent::ReceiveSyn, valid) {
            Some(t) => self.fire(t, segment.seq_no + 1, &[]),
            None => Ok(()),
        }
    }

    pub fn receive_syn_ack(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let valid = segment.flags.contains(TcpFlags::SYN | TcpFlags::ACK);
        let Some(t) = self.lookup(TcpEvent::ReceiveSynAck, valid) else {
            return Ok(());
        };
        self.fire(t, segment.seq_no + 1, &[])?;
        self.timer.acknowledge(segment.ack_no);
        Ok(())
    }

    /// Accept in-order data. Returns the number of bytes taken.
    pub fn receive_data(&mut self, segment: &TcpHeader) -> Result<usize, TcpError> {
        let valid = !segment.payload.is_empty() && segment.seq_no == self.ack_no;
        let Some(t) = self.lookup(TcpEvent::ReceiveData, valid) else {
            return Ok(0);
        };
        let len = segment.payload.len();
        self.fire(t, self.ack_no + len as u32, &[])?;
        if segment.flags.contains(TcpFlags::ACK) {
            self.timer.acknowledge(segment.ack_no);
        }
        Ok(len)
    }

    pub fn receive_ack_for_fin(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let valid = segment.flags.contains(TcpFlags::ACK);
        let Some(t) = self.lookup(TcpEvent::ReceiveAckForFin, valid) else {
            return Ok(());
        };
        self.fire(t, self.ack_no, &[])?;
        self.timer.acknowledge(segment.ack_no);
        Ok(())
    }

    /// Accept the peer's FIN once every byte before it has been taken. In
    /// CLOSE_WAIT a resent FIN (one behind `ack_no`) also counts.
    pub fn receive_fin(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let fin_seq = segment.seq_no + segment.payload.len() as u32;
        let in_order = fin_seq == self.ack_no
            || (self.state == TcpState::CloseWait && fin_seq + 1 == self.ack_no);
        let valid = segment.flags.contains(TcpFlags::FIN) && in_order;
        match self.lookup(TcpEvent::ReceiveFin, valid) {
            Some(t) => self.fire(t, fin_seq + 1, &[]),
            None => Ok(()),
        }
    }

    pub fn receive_ack(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let valid = segment.flags.contains(TcpFlags::ACK);
        let Some(t) = self.lookup(TcpEvent::ReceiveAck, valid) else {
            return Ok(());
        };
        self.fire(t, self.ack_no, &[])?;
        self.timer.acknowledge(segment.ack_no);
        Ok(())
    }

    /// Abort on RST from any state but CLOSED.
    pub fn receive_rst(&mut self, segment: &TcpHeader) -> Result<(), TcpError> {
        let valid = segment.flags.contains(TcpFlags::RST);
        match self.lookup(TcpEvent::ReceiveRst, valid) {
            Some(t) => self.fire(t, self.ack_no, &[]),
            None => Ok(()),
        }
    }

    /// Route an inbound segment to the event the current state expects.
    /// Returns the number of payload bytes accepted.
    pub fn on_segment(&mut self, segment: &TcpHeader) -> Result<usize, TcpError> {
        if segment.flags.contains(TcpFlags::RST) {
            self.receive_rst(segment)?;
            return Ok(0);
        }

        let mut accepted = 0;
        match self.state {
            TcpState::Listen => self.receive_syn(segment)?,
            TcpState::SynSent => self.receive_syn_ack(segment)?,
            TcpState::Established => {
                let mut driven = false;
                if segment.flags.contains(TcpFlags::ACK) {
                    self.receive_ack(segment)?;
                    driven = true;
                }
                if !segment.payload.is_empty() {
                    accepted = self.receive_data(segment)?;
                    driven = true;
                }
                // A FIN behind rejected data would skip the gap
                if segment.flags.contains(TcpFlags::FIN) && (segment.payload.is_empty() || accepted > 0) {
                    self.receive_fin(segment)?;
                    driven = true;
                }
                if !driven {
                    self.ignore(TcpEvent::ReceiveAck);
                }
            }
            TcpState::FinWait1 => {
                self.receive_ack_for_fin(segment)?;
                // ACK and FIN together: apply them in order
                if self.state == TcpState::FinWait2 && segment.flags.contains(TcpFlags::FIN) {
                    self.receive_fin(segment)?;
                }
            }
            TcpState::FinWait2 | TcpState::CloseWait => self.receive_fin(segment)?,
            TcpState::LastAck => self.receive_ack(segment)?,
            TcpState::Closed | TcpState::SynReceived | TcpState::Closing | TcpState::TimeWait => {
                self.ignore(TcpEvent::ReceiveAck);
            }
        }
        Ok(accepted)
    }

    // -- Timers --

    /// Drive time-based behavior. Leaves TIME_WAIT after 2*MSL, otherwise resends
    /// the pending frame once the retransmission timeout has passed.
    /// Returns whether a frame was retransmitted.
    pub fn check_timeout(&mut self, now: Instant) -> Result<bool, TcpError> {
        if self.state == TcpState::TimeWait {
            let expired = self
                .time_wait_since
                .map_or(true, |since| now.saturating_duration_since(since) >= self.config.time_wait());
            if expired {
                if let Some(t) = self.lookup(TcpEvent::TimeWaitExpired, true) {
                    self.fire(t, self.ack_no, &[])?;
                }
            }
            return Ok(false);
        }

        let Some(frame) = self.timer.poll(now) else {
            return Ok(false);
        };
        info!(state = %self.state, len = frame.len(), "retransmitting");
        self.sink.send_frame(&frame).map_err(|e| {
            warn!(error = %e, "retransmission failed");
            TcpError::from(e)
        })?;
        Ok(true)
    }

    // -- Internals --

    /// Find the row for `event`, or count the event as ignored.
    fn lookup(&mut self, event: TcpEvent, valid: bool) -> Option<&'static Transition> {
        let row = state::transition(self.state, event).filter(|_| valid);
        if row.is_none() {
            self.ignore(event);
        }
        row
    }

    fn ignore(&mut self, event: TcpEvent) {
        self.ignored_events += 1;
        trace!(state = %self.state, ?event, "ignoring event");
    }

    /// Emit the row's segment, then commit `ack_no` and the new state.
    fn fire(&mut self, t: &Transition, ack_no: Wrap32, payload: &[u8]) -> Result<(), TcpError> {
        let seq_no = self.seq_no;
        if let Some(flags) = t.emit {
            self.transmit(flags, seq_no, ack_no, payload)?;
            self.seq_no = seq_no + flags.seq_len() + payload.len() as u32;
        }
        self.ack_no = ack_no;

        debug!(from = %t.from, to = %t.to, event = ?t.event, seq = %self.seq_no, ack = %self.ack_no, "state transition");
        self.state = t.to;
        match t.to {
            TcpState::Closed => {
                self.timer.clear();
                self.time_wait_since = None;
            }
            TcpState::TimeWait => self.time_wait_since = Some(self.clock.now()),
            _ => {}
        }
        Ok(())
    }

    fn transmit(&mut self, flags: TcpFlags, seq_no: Wrap32, ack_no: Wrap32, payload: &[u8]) -> Result<(), TcpError> {
        let mut header = TcpHeader::new(self.local.port(), self.remote.port(), seq_no, ack_no, flags);
        header.window = self.config.window;
        header.payload = payload.to_vec();
        let seq_len = header.seq_len();
        let segment = header.encode(*self.local.ip(), *self.remote.ip())?;

        let mut packet = Ipv4Packet::new(protocol::TCP, *self.local.ip(), *self.remote.ip(), segment);
        packet.ttl = self.config.ttl;
        let frame = EthernetFrame::new(self.remote_mac, self.local_mac, ethertype::IPV4, packet.encode()?).encode();

        self.sink.send_frame(&frame).map_err(|e| {
            warn!(error = %e, ?flags, "failed to send segment");
            TcpError::from(e)
        })?;
        trace!(?flags, seq = %seq_no, ack = %ack_no, len = payload.len(), "sent segment");
        self.timer.record(seq_no, seq_len, frame, self.clock.now());
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: TcpState) {
        self.state = state;
        if state == TcpState::TimeWait {
            self.time_wait_since = Some(self.clock.now());
        }
    }
}

// -- Unit tests --
