//! The byte-stream seam between the core and the serial driver.
//!
//! The core never talks to hardware: it drains whatever bytes the driver
//! already has, writes complete frames back, and reads a monotonic clock.
//! Everything is non-blocking; a [`Transport`] must return immediately.
//!
//! [`MockTransport`] implements the trait over in-memory buffers with a
//! manually advanced clock, which is how the state-machine timings are
//! tested without a serial port.

use std::collections::VecDeque;
use std::io;

/// Non-blocking byte I/O plus a monotonic clock.
///
/// This is the only contract the core has with the outside world. The
/// bridge borrows a transport for the duration of one tick; it never stores
/// it.
pub trait Transport {
    /// Number of bytes ready to read without blocking.
    fn available(&self) -> usize;

    /// Read one byte. Only called when `available() > 0`.
    fn read_byte(&mut self) -> u8;

    /// Write a complete frame to the bus.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Monotonic milliseconds. Never goes backwards.
    fn now_ms(&self) -> u64;
}

/// In-memory transport for tests: scripted receive bytes, captured
/// transmissions, and a clock the test advances by hand.
#[derive(Debug, Default)]
pub struct MockTransport {
    rx: VecDeque<u8>,
    /// Every `write_all` call, in order.
    pub tx: Vec<Vec<u8>>,
    now_ms: u64,
}

impl MockTransport {
    /// Create an empty mock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the core to read.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Move the clock forward.
    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Set the clock to an absolute value.
    pub fn set_now(&mut self, ms: u64) {
        debug_assert!(ms >= self.now_ms, "mock clock must be monotonic");
        self.now_ms = ms;
    }

    /// Bytes written so far, flattened into one stream.
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.tx.iter().flatten().copied().collect()
    }
}

impl Transport for MockTransport {
    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read_byte(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx.push(bytes.to_vec());
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_feed_and_read() {
        let mut mock = MockTransport::new();
        mock.feed(&[1, 2, 3]);
        assert_eq!(mock.available(), 3);
        assert_eq!(mock.read_byte(), 1);
        assert_eq!(mock.read_byte(), 2);
        assert_eq!(mock.available(), 1);
    }

    #[test]
    fn test_mock_clock() {
        let mut mock = MockTransport::new();
        assert_eq!(mock.now_ms(), 0);
        mock.advance(750);
        assert_eq!(mock.now_ms(), 750);
        mock.set_now(1_000);
        assert_eq!(mock.now_ms(), 1_000);
    }

    #[test]
    fn test_mock_captures_writes() {
        let mut mock = MockTransport::new();
        mock.write_all(&[0x32, 0x34]).unwrap();
        mock.write_all(&[0xFF]).unwrap();
        assert_eq!(mock.tx.len(), 2);
        assert_eq!(mock.tx_bytes(), [0x32, 0x34, 0xFF]);
    }
}
