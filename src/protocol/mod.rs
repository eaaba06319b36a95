//! NASA protocol: wire format, packet codec, reassembly, and translation.
//!
//! Layering, bottom up:
//! - [`wire_format`] — framing constants, addresses, the command header,
//!   and the bus CRC
//! - [`message`] — typed message sets and their payload codecs
//! - [`packet`] — whole-frame encode/decode with framing validation
//! - [`frame_buffer`] — byte-stream reassembly with resync and silence
//!   recovery
//! - [`translator`] — packets to device events and control requests to
//!   packets
//!
//! Everything here is pure with respect to bridge state: the codec and the
//! translator return values, and only the frame buffer holds (byte-level)
//! state of its own.

pub mod frame_buffer;
pub mod message;
pub mod packet;
pub mod translator;
pub mod wire_format;

pub use frame_buffer::FrameBuffer;
pub use message::{msg, MessageSet, MessageSetType, Value};
pub use packet::Packet;
pub use translator::{build_request, interpret, DeviceEvent, EventKind, Inbound};
pub use wire_format::{crc16, Address, AddressClass, Command, DataType, PacketType};
