//! Frame buffer: byte stream in, whole packets out.
//!
//! The bus is half-duplex and noisy; bytes arrive fragmented, sometimes
//! mid-frame, sometimes as line garbage. The buffer accumulates reads and
//! resynchronises on the 0x32 start marker:
//!
//! - at most `read_chunk_limit` bytes are drained per poll, so a chatty bus
//!   cannot starve the rest of the tick;
//! - a decode failure discards exactly one byte and retries, so trailing
//!   junk is worked through without losing a frame embedded in it;
//! - `silence_timeout_ms` without a byte clears the buffer, the recovery of
//!   last resort for a partial frame whose tail never arrives.
//!
//! One poll delivers at most one packet.

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use super::packet::Packet;
use super::wire_format::{MAX_PACKET_SIZE, START_BYTE};
use crate::transport::Transport;

/// Reassembles NASA frames from a non-blocking byte stream.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes, always starting at a frame boundary candidate.
    buffer: BytesMut,
    /// Clock reading when the last byte arrived.
    last_byte_ms: u64,
    /// Per-poll read cap.
    read_chunk_limit: usize,
    /// Inter-frame silence window.
    silence_timeout_ms: u64,
}

impl FrameBuffer {
    /// Create a buffer with the given read cap and silence window.
    pub fn new(read_chunk_limit: usize, silence_timeout_ms: u64) -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_PACKET_SIZE),
            last_byte_ms: 0,
            read_chunk_limit,
            silence_timeout_ms,
        }
    }

    /// Drain available bytes and try to produce one packet.
    ///
    /// Call once per tick. Returns `Some` at most once per call even if
    /// several complete frames are buffered; the next poll picks up the
    /// rest without reading more bytes than the cap allows.
    pub fn poll(&mut self, io: &mut dyn Transport) -> Option<Packet> {
        let now = io.now_ms();

        let mut budget = self.read_chunk_limit;
        while budget > 0 && io.available() > 0 {
            self.buffer.extend_from_slice(&[io.read_byte()]);
            self.last_byte_ms = now;
            budget -= 1;
        }

        let packet = self.try_extract();

        if !self.buffer.is_empty()
            && now.saturating_sub(self.last_byte_ms) >= self.silence_timeout_ms
        {
            debug!(
                buffered = self.buffer.len(),
                "inter-frame silence, clearing reassembly buffer"
            );
            self.buffer.clear();
        }

        packet
    }

    /// Number of bytes currently buffered.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn try_extract(&mut self) -> Option<Packet> {
        loop {
            // Resync: a frame can only start at 0x32.
            while !self.buffer.is_empty() && self.buffer[0] != START_BYTE {
                self.buffer.advance(1);
            }

            if self.buffer.len() < 3 {
                return None;
            }

            let declared = usize::from(u16::from_be_bytes([self.buffer[1], self.buffer[2]])) + 2;
            if declared > MAX_PACKET_SIZE {
                // Cannot be a frame; don't wait kilobytes for a doomed
                // decode. Skipping one byte lands in the same place the
                // decoder's size check eventually would.
                self.buffer.advance(1);
                continue;
            }
            if self.buffer.len() < declared {
                return None;
            }

            match Packet::decode(&self.buffer[..declared]) {
                Ok(packet) => {
                    self.buffer.advance(declared);
                    return Some(packet);
                }
                Err(error) => {
                    trace!(%error, "frame candidate rejected, resyncing");
                    self.buffer.advance(1);
                }
            }
        }
    }
}
