//! # Printer Transport Layer
//!
//! Byte channels the encoder writes through. A channel only promises that
//! bytes arrive in the order they were sent; pacing is the encoder's job.
//!
//! ## Available Transports
//!
//! - [`serial`]: raw TTY serial port (Linux/macOS)
//! - [`MemoryChannel`]: in-memory capture for tests and dry runs

use std::collections::VecDeque;

use crate::error::TermicaError;

pub mod serial;

pub use serial::SerialTransport;

/// Ordered raw byte transport to the printer.
pub trait ByteChannel {
    /// Send all bytes as one ordered unit.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TermicaError>;

    /// Read up to `n` bytes. Fewer (possibly zero) bytes mean the printer
    /// did not answer in time.
    fn receive(&mut self, n: usize) -> Result<Vec<u8>, TermicaError>;
}

impl<T: ByteChannel + ?Sized> ByteChannel for &mut T {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        (**self).send(bytes)
    }

    fn receive(&mut self, n: usize) -> Result<Vec<u8>, TermicaError> {
        (**self).receive(n)
    }
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        (**self).send(bytes)
    }

    fn receive(&mut self, n: usize) -> Result<Vec<u8>, TermicaError> {
        (**self).receive(n)
    }
}

/// # In-Memory Channel
///
/// Records everything sent and answers reads from a queue of scripted
/// response bytes.
///
/// ```
/// use termica::transport::{ByteChannel, MemoryChannel};
///
/// let mut channel = MemoryChannel::new();
/// channel.queue_response(&[0x00]);
/// channel.send(&[0x1B, 0x76, 0x00])?;
/// assert_eq!(channel.receive(1)?, vec![0x00]);
/// assert_eq!(channel.sent(), &[0x1B, 0x76, 0x00]);
/// # Ok::<(), termica::TermicaError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    sent: Vec<u8>,
    sends: usize,
    responses: VecDeque<u8>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of `send` calls so far
    pub fn send_count(&self) -> usize {
        self.sends
    }

    /// Take the captured bytes, leaving the capture empty.
    pub fn take_sent(&mut self) -> Vec<u8> {
        self.sends = 0;
        std::mem::take(&mut self.sent)
    }

    /// Append bytes for later `receive` calls to return.
    pub fn queue_response(&mut self, bytes: &[u8]) {
        self.responses.extend(bytes);
    }
}

impl ByteChannel for MemoryChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        self.sent.extend_from_slice(bytes);
        self.sends += 1;
        Ok(())
    }

    fn receive(&mut self, n: usize) -> Result<Vec<u8>, TermicaError> {
        let n = n.min(self.responses.len());
        Ok(self.responses.drain(..n).collect())
    }
}
