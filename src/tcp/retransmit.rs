use std::collections::VecDeque;
use std::time::{Duration, Instant};
use crate::tcp::wrap32::Wrap32;

/// Which frames the timer keeps around for resending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetransmitPolicy {
    /// Remember only the most recent frame, whatever it carried.
    #[default]
    LastSegment,
    /// Remember every frame that consumed sequence space until it is acked.
    Outstanding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSegment {
    pub seq_no: Wrap32,
    pub seq_len: u32,
    pub frame: Vec<u8>, // Exact bytes handed to the sink
}

impl SentSegment {
    /// First sequence number after this segment.
    pub fn end(&self) -> Wrap32 {
        self.seq_no + self.seq_len
    }
}

/// A single coarse timer: once `rto` passes without a send, the pending frame
/// goes out again unchanged.
#[derive(Debug, Clone)]
pub struct RetransmissionTimer {
    policy: RetransmitPolicy,
    rto: Duration,
    segments: VecDeque<SentSegment>,
    last_send_time: Option<Instant>,
}

impl RetransmissionTimer {
    pub fn new(policy: RetransmitPolicy, rto: Duration) -> Self {
        RetransmissionTimer {
            policy,
            rto,
            segments: VecDeque::new(),
            last_send_time: None,
        }
    }

    pub fn policy(&self) -> RetransmitPolicy {
        self.policy
    }

    pub fn last_send_time(&self) -> Option<Instant> {
        self.last_send_time
    }

    /// Frames currently held for retransmission.
    pub fn pending(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Note a frame that just went out.
    pub fn record(&mut self, seq_no: Wrap32, seq_len: u32, frame: Vec<u8>, now: Instant) {
        let segment = SentSegment { seq_no, seq_len, frame };
        match self.policy {
            RetransmitPolicy::LastSegment => {
                self.segments.clear();
                self.segments.push_back(segment);
            }
            RetransmitPolicy::Outstanding => {
                if seq_len > 0 {
                    self.segments.push_back(segment);
                }
            }
        }
        self.last_send_time = Some(now);
    }

    /// Drop every held frame the cumulative `ack_no` fully covers.
    /// Returns how many were retired.
    pub fn acknowledge(&mut self, ack_no: Wrap32) -> usize {
        let before = self.segments.len();
        self.segments.retain(|s| s.seq_len == 0 || !s.end().is_at_or_before(ack_no));
        before - self.segments.len()
    }

    /// True once strictly more than `rto` has passed since the last send.
    pub fn expired(&self, now: Instant) -> bool {
        match self.last_send_time {
            Some(sent) => now.saturating_duration_since(sent) > self.rto,
            None => false,
        }
    }

    /// If the timer has expired and a frame is held, return it and restart the clock.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<u8>> {
        if !self.expired(now) {
            return None;
        }
        let segment = match self.policy {
            RetransmitPolicy::LastSegment => self.segments.back(),
            RetransmitPolicy::Outstanding => self.segments.front(),
        }?;
        let frame = segment.frame.clone();
        self.last_send_time = Some(now);
        Some(frame)
    }

    pub fn clear(&mut self) {
        self.segments.clear();
        self.last_send_time = None;
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;

    const RTO: Duration = Duration::from_secs(3);
    const EPSILON: Duration = Duration::from_millis(1);

    #[test]
    fn test_not_due_before_rto() {
        let start = Instant::now();
        let mut timer = RetransmissionTimer::new(RetransmitPolicy::LastSegment, RTO);
        assert_eq!(timer.poll(start + RTO * 10), None);

        timer.record(Wrap32::new(0), 1, vec![1], start);
        assert_eq!(timer.poll(start + RTO), None);
        assert_eq!(timer.poll(start + RTO + EPSILON), Some(vec![1]));

        // Clock restarts after a resend
        assert_eq!(timer.poll(start + RTO + EPSILON * 2), None);
        assert_eq!(timer.poll(start + RTO * 2 + EPSILON * 2), Some(vec![1]));
    }

    #[test]
    fn test_last_segment_replaces() {
        let start = Instant::now();
        let mut timer = RetransmissionTimer::new(RetransmitPolicy::LastSegment, RTO);
        timer.record(Wrap32::new(0), 1, vec![1], start);
        timer.record(Wrap32::new(1), 0, vec![2], start);
        assert_eq!(timer.pending(), 1);
        assert_eq!(timer.poll(start + RTO + EPSILON), Some(vec![2]));
    }

    #[test]
    fn test_outstanding_retires_on_ack() {
        let start = Instant::now();
        let mut timer = RetransmissionTimer::new(RetransmitPolicy::Outstanding, RTO);
        timer.record(Wrap32::new(100), 1, vec![1], start); // SYN
        timer.record(Wrap32::new(101), 0, vec![2], start); // bare ACK, not held
        timer.record(Wrap32::new(101), 10, vec![3], start);
        assert_eq!(timer.pending(), 2);

        assert_eq!(timer.acknowledge(Wrap32::new(101)), 1);
        assert_eq!(timer.poll(start + RTO + EPSILON), Some(vec![3]));

        // Partial ack keeps it
        assert_eq!(timer.acknowledge(Wrap32::new(105)), 0);
        assert_eq!(timer.acknowledge(Wrap32::new(111)), 1);
        assert!(timer.is_empty());
        assert_eq!(timer.poll(start + RTO * 10), None);
    }

    #[test]
    fn test_ack_across_wraparound() {
        let start = Instant::now();
        let mut timer = RetransmissionTimer::new(RetransmitPolicy::Outstanding, RTO);
        timer.record(Wrap32::new(u32::MAX - 1), 4, vec![1], start);
        assert_eq!(timer.acknowledge(Wrap32::new(u32::MAX)), 0);
        assert_eq!(timer.acknowledge(Wrap32::new(2)), 1);
    }

    #[test]
    fn test_clear() {
        let start = Instant::now();
        let mut timer = RetransmissionTimer::new(RetransmitPolicy::LastSegment, RTO);
        timer.record(Wrap32::new(0), 1, vec![1], start);
        timer.clear();
        assert!(timer.last_send_time().is_none());
        assert_eq!(timer.poll(start + RTO * 10), None);
    }
}
