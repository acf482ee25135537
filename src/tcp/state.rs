use std::fmt;
use crate::tcp::tcp_flags::TcpFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpState {
    Closed, // No connection

    // -- Opening states --
    Listen,      // Waiting for SYN
    SynSent,     // SYN sent, waiting for SYN-ACK
    SynReceived, // SYN received, expecting ACK

    // -- Steady state; opened --
    Established, // Connection established, exchanging data

    // -- Active close states --
    FinWait1, // FIN sent, waiting for ACK of FIN
    FinWait2, // FIN acknowledged, waiting for FIN from peer
    Closing,  // Simultaneous close. Declared but no transition enters it
    TimeWait, // Both FINs acknowledged, waiting out 2*MSL

    // -- Passive close states --
    CloseWait, // FIN received, waiting for application to close
    LastAck,   // FIN sent, waiting for ACK
}

impl TcpState {
    pub const ALL: [TcpState; 11] = [
        TcpState::Closed,
        TcpState::Listen,
        TcpState::SynSent,
        TcpState::SynReceived,
        TcpState::Established,
        TcpState::FinWait1,
        TcpState::FinWait2,
        TcpState::Closing,
        TcpState::TimeWait,
        TcpState::CloseWait,
        TcpState::LastAck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TcpState::Closed => "CLOSED",
            TcpState::Listen => "LISTEN",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynReceived => "SYN_RECEIVED",
            TcpState::Established => "ESTABLISHED",
            TcpState::FinWait1 => "FIN_WAIT_1",
            TcpState::FinWait2 => "FIN_WAIT_2",
            TcpState::Closing => "CLOSING",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that can happen to a connection: a local call or an inbound segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpEvent {
    Listen,
    SendSyn,
    ReceiveSyn,
    ReceiveSynAck,
    SendAck,
    SendData,
    ReceiveData,
    SendFin,
    ReceiveAckForFin,
    ReceiveFin,
    ReceiveAck,
    ReceiveRst,
    TimeWaitExpired,
}

impl TcpEvent {
    pub const ALL: [TcpEvent; 13] = [
        TcpEvent::Listen,
        TcpEvent::SendSyn,
        TcpEvent::ReceiveSyn,
        TcpEvent::ReceiveSynAck,
        TcpEvent::SendAck,
        TcpEvent::SendData,
        TcpEvent::ReceiveData,
        TcpEvent::SendFin,
        TcpEvent::ReceiveAckForFin,
        TcpEvent::ReceiveFin,
        TcpEvent::ReceiveAck,
        TcpEvent::ReceiveRst,
        TcpEvent::TimeWaitExpired,
    ];
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TcpState,
    pub event: TcpEvent,
    pub to: TcpState,
    /// Flags of the segment emitted on this transition, if any.
    pub emit: Option<TcpFlags>,
}

const fn row(from: TcpState, event: TcpEvent, to: TcpState, emit: Option<TcpFlags>) -> Transition {
    Transition { from, event, to, emit }
}

const SYN: Option<TcpFlags> = Some(TcpFlags::SYN);
const ACK: Option<TcpFlags> = Some(TcpFlags::ACK);
const FIN: Option<TcpFlags> = Some(TcpFlags::FIN);
const PSH_ACK: Option<TcpFlags> = Some(TcpFlags::PSH.union(TcpFlags::ACK));

/// Every legal (state, event) pair. Anything not listed is ignored.
pub const TRANSITIONS: &[Transition] = &[
    // Opening
    row(TcpState::Closed, TcpEvent::Listen, TcpState::Listen, None),
    row(TcpState::Closed, TcpEvent::SendSyn, TcpState::SynSent, SYN),
    row(TcpState::Listen, TcpEvent::ReceiveSyn, TcpState::SynReceived, None),
    row(TcpState::SynSent, TcpEvent::ReceiveSynAck, TcpState::Established, ACK),
    row(TcpState::SynReceived, TcpEvent::SendAck, TcpState::Established, ACK),
    // Data
    row(TcpState::Established, TcpEvent::SendData, TcpState::Established, PSH_ACK),
    row(TcpState::Established, TcpEvent::ReceiveData, TcpState::Established, ACK),
    row(TcpState::Established, TcpEvent::ReceiveAck, TcpState::Established, None),
    // Active close
    row(TcpState::Established, TcpEvent::SendFin, TcpState::FinWait1, FIN),
    row(TcpState::FinWait1, TcpEvent::ReceiveAckForFin, TcpState::FinWait2, None),
    row(TcpState::FinWait2, TcpEvent::ReceiveFin, TcpState::TimeWait, ACK),
    row(TcpState::TimeWait, TcpEvent::TimeWaitExpired, TcpState::Closed, None),
    // Passive close
    row(TcpState::Established, TcpEvent::ReceiveFin, TcpState::CloseWait, None),
    row(TcpState::CloseWait, TcpEvent::ReceiveFin, TcpState::LastAck, ACK),
    row(TcpState::CloseWait, TcpEvent::SendFin, TcpState::LastAck, FIN),
    row(TcpState::LastAck, TcpEvent::ReceiveAck, TcpState::Closed, None),
    // Reset
    row(TcpState::Listen, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::SynSent, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::SynReceived, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::Established, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::FinWait1, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::FinWait2, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::Closing, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::TimeWait, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::CloseWait, TcpEvent::ReceiveRst, TcpState::Closed, None),
    row(TcpState::LastAck, TcpEvent::ReceiveRst, TcpState::Closed, None),
];

/// Look up the row for `event` in `state`.
pub fn transition(state: TcpState, event: TcpEvent) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == state && t.event == event)
}

// -- Unit tests --
