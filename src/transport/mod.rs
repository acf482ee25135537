//! Where finished frames go.
//!
//! A connection never owns a socket. It hands every serialized Ethernet frame
//! to a [`TransportSink`], which may be a raw socket, a capture buffer, or a
//! closure in a test.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error), // Wrapper around std::io::Error

    #[error("Frame rejected: {0}")]
    Rejected(String),
}

pub trait TransportSink {
    /// Deliver one complete Ethernet frame.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<T: TransportSink + ?Sized> TransportSink for &mut T {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send_frame(frame)
    }
}

impl<T: TransportSink + ?Sized> TransportSink for Box<T> {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send_frame(frame)
    }
}

/// Adapts a closure into a sink.
pub struct FnSink<F>(pub F);

impl<F> TransportSink for FnSink<F>
where
    F: FnMut(&[u8]) -> Result<(), TransportError>,
{
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (self.0)(frame)
    }
}

/// Keeps every frame in memory, in send order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    frames: Vec<Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.frames.last().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drain the captured frames.
    pub fn take(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.frames)
    }
}

impl TransportSink for MemorySink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

// -- Unit tests --
