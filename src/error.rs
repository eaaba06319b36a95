//! Error types for nasa-bridge.
//!
//! All fallible operations return enumerated errors; nothing in the core
//! panics on bus input. Frame decode failures get their own enum because the
//! reassembler handles them specially (discard one byte, resync) instead of
//! surfacing them to the caller.

use thiserror::Error;

/// Why a byte slice failed to decode as a NASA frame.
///
/// Each variant maps to one framing check, in the order the decoder runs
/// them. The reassembler treats every variant the same way — drop the
/// leading byte and retry — but the distinction matters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// First byte is not the 0x32 start marker.
    #[error("invalid start byte 0x{found:02x}")]
    InvalidStartByte {
        /// The byte found where 0x32 was expected.
        found: u8,
    },

    /// Frame is shorter than 16 bytes or longer than 1500 bytes.
    #[error("unexpected frame size {size}")]
    UnexpectedSize {
        /// Total slice length in bytes.
        size: usize,
    },

    /// Declared length field disagrees with the slice length.
    #[error("declared size {declared} + 2 does not match frame size {actual}")]
    SizeDidNotMatch {
        /// Value of the 16-bit length field.
        declared: usize,
        /// Actual slice length.
        actual: usize,
    },

    /// Last byte is not the 0x34 end marker.
    #[error("invalid end byte 0x{found:02x}")]
    InvalidEndByte {
        /// The byte found where 0x34 was expected.
        found: u8,
    },

    /// CRC-16 over the frame body disagrees with the trailing checksum.
    #[error("crc mismatch: computed 0x{computed:04x}, frame carries 0x{expected:04x}")]
    CrcError {
        /// CRC computed over the received bytes.
        computed: u16,
        /// CRC carried in the frame.
        expected: u16,
    },
}

/// Main error type for bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O error while writing to the serial transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame failed to decode. Surfaced only by direct codec use; the
    /// reassembler swallows these and resyncs.
    #[error("frame decode error: {0}")]
    Decode(#[from] DecodeError),

    /// An address string did not parse as `hh.hh.hh`.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// A control request targeted an address never seen on the bus.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The command queue is at its configured depth limit.
    #[error("command queue full (depth {depth})")]
    QueueFull {
        /// The depth limit that was hit.
        depth: usize,
    },
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
