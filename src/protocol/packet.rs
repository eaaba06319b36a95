//! Whole-frame packet codec.
//!
//! [`Packet`] ties the wire-format pieces together: addresses, command
//! header, and the message list. `encode` produces a complete frame ready
//! for the bus; `decode` validates framing, length, and CRC before touching
//! the payload, returning a specific [`DecodeError`] for each way a frame
//! can be bad.

use tracing::warn;

use super::message::{MessageDecodeIssue, MessageSet};
use super::wire_format::{
    crc16, Address, Command, DataType, ADDRESS_SIZE, COMMAND_SIZE, CRC_REGION_START, END_BYTE,
    MAX_PACKET_SIZE, MIN_PACKET_SIZE, START_BYTE,
};
use crate::error::DecodeError;

/// Offset of the message-count byte within a frame.
const COUNT_OFFSET: usize = CRC_REGION_START + 2 * ADDRESS_SIZE + COMMAND_SIZE;

/// A decoded (or to-be-encoded) NASA packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Sender address.
    pub source: Address,
    /// Receiver address.
    pub destination: Address,
    /// Command header.
    pub command: Command,
    /// Message sets, in wire order.
    pub messages: Vec<MessageSet>,
}

impl Packet {
    /// Start an outgoing packet from the local address, messages to be
    /// filled in by the caller.
    pub fn outgoing(destination: Address, data_type: DataType, packet_number: u8) -> Self {
        Self {
            source: Address::local(),
            destination,
            command: Command::outgoing(data_type, packet_number),
            messages: Vec::new(),
        }
    }

    /// Encode the packet into a complete frame.
    ///
    /// The length field is back-filled with `frame_len - 2` so that a
    /// decoder's `declared + 2 == frame_len` check holds, and the CRC
    /// covers source address through the last message byte.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(MIN_PACKET_SIZE + 8 * self.messages.len());

        data.push(START_BYTE);
        data.extend_from_slice(&[0, 0]); // length, back-filled below
        self.source.encode(&mut data);
        self.destination.encode(&mut data);
        self.command.encode(&mut data);

        data.push(self.messages.len() as u8);
        for message in &self.messages {
            message.encode(&mut data);
        }

        let declared = (data.len() + 1) as u16;
        data[1..3].copy_from_slice(&declared.to_be_bytes());

        let crc = crc16(&data[CRC_REGION_START..]);
        data.extend_from_slice(&crc.to_be_bytes());
        data.push(END_BYTE);

        data
    }

    /// Decode one complete frame.
    ///
    /// `data` must be exactly one frame; the reassembler guarantees that by
    /// slicing on the declared length before calling in. Malformed message
    /// sets inside a structurally valid frame are dropped with a warning
    /// rather than failing the whole packet, so the rest stays inspectable.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.first() != Some(&START_BYTE) {
            return Err(DecodeError::InvalidStartByte {
                found: data.first().copied().unwrap_or(0),
            });
        }
        if data.len() < MIN_PACKET_SIZE || data.len() > MAX_PACKET_SIZE {
            return Err(DecodeError::UnexpectedSize { size: data.len() });
        }
        let declared = usize::from(u16::from_be_bytes([data[1], data[2]]));
        if declared + 2 != data.len() {
            return Err(DecodeError::SizeDidNotMatch {
                declared,
                actual: data.len(),
            });
        }
        if data[data.len() - 1] != END_BYTE {
            return Err(DecodeError::InvalidEndByte {
                found: data[data.len() - 1],
            });
        }

        let crc_region = &data[CRC_REGION_START..data.len() - 3];
        let computed = crc16(crc_region);
        let expected = u16::from_be_bytes([data[data.len() - 3], data[data.len() - 2]]);
        if computed != expected {
            return Err(DecodeError::CrcError { computed, expected });
        }

        let mut cursor = CRC_REGION_START;
        let source = Address::decode(&data[cursor..]);
        cursor += ADDRESS_SIZE;
        let destination = Address::decode(&data[cursor..]);
        cursor += ADDRESS_SIZE;
        let command = Command::decode(&data[cursor..]);
        cursor += COMMAND_SIZE;

        let capacity = data[cursor];
        cursor += 1;
        debug_assert_eq!(cursor, COUNT_OFFSET + 1);

        // Everything between the count byte and the CRC.
        let region = &data[cursor..data.len() - 3];
        let mut messages = Vec::with_capacity(usize::from(capacity));
        let mut offset = 0;
        for _ in 0..capacity {
            match MessageSet::decode(region, offset, capacity) {
                Ok((message, size)) => {
                    messages.push(message);
                    offset += size;
                }
                Err(MessageDecodeIssue::StructureNotAlone { capacity }) => {
                    warn!(capacity, "structure message in multi-message packet, dropping");
                    offset += 2;
                }
                Err(MessageDecodeIssue::Truncated) => {
                    warn!(capacity, offset, "message region shorter than declared count");
                    break;
                }
            }
        }

        Ok(Self {
            source,
            destination,
            command,
            messages,
        })
    }
}
