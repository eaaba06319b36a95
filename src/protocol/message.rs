//! Typed message sets.
//!
//! A message set is the key/value unit inside a packet: a 16-bit message
//! number followed by a payload whose shape is encoded *in the number
//! itself* — bits 9–10 select one of four payload kinds:
//!
//! ```text
//! 00  Enum          1 byte
//! 01  Variable      u16, big-endian
//! 10  LongVariable  u32, little-endian (sic — the bus really mixes orders)
//! 11  Structure     opaque bytes, runs to two bytes before the end marker
//! ```
//!
//! A structure message is only legal as the sole message of a packet; its
//! length is inferred from the frame, so nothing could follow it.

use bytes::Bytes;

/// Message numbers observed on the bus that this bridge interprets.
///
/// The number space is Samsung's; anything not listed here still flows
/// through as a custom sensor reading.
pub mod msg {
    /// Power on/off (enum, 0/1).
    pub const ENUM_IN_OPERATION_POWER: u16 = 0x4000;
    /// Operation mode (enum, see `Mode`).
    pub const ENUM_IN_OPERATION_MODE: u16 = 0x4001;
    /// Commanded fan mode (enum, see `FanMode`).
    pub const ENUM_IN_FAN_MODE: u16 = 0x4006;
    /// Fan mode as the unit actually runs it (enum, extended table).
    pub const ENUM_IN_FAN_MODE_REAL: u16 = 0x4007;
    /// Vertical louver swing (enum, 0/1).
    pub const ENUM_IN_LOUVER_HL_SWING: u16 = 0x4011;
    /// Preset a.k.a. alt mode (enum, raw preset code).
    pub const ENUM_IN_ALT_MODE: u16 = 0x4060;
    /// Horizontal louver swing (enum, 0/1).
    pub const ENUM_IN_LOUVER_LR_SWING: u16 = 0x407E;
    /// Target temperature, tenths of a degree (var).
    pub const VAR_IN_TEMP_TARGET_F: u16 = 0x4201;
    /// Room temperature, tenths of a degree (var).
    pub const VAR_IN_TEMP_ROOM_F: u16 = 0x4203;
    /// Evaporator inlet temperature, signed tenths (var).
    pub const VAR_IN_TEMP_EVA_IN_F: u16 = 0x4205;
    /// Evaporator outlet temperature, signed tenths (var).
    pub const VAR_IN_TEMP_EVA_OUT_F: u16 = 0x4206;
    /// Outdoor air temperature, signed tenths (var).
    pub const VAR_OUT_SENSOR_AIROUT: u16 = 0x8204;
    /// Outdoor unit CT1 current, tenths of an ampere (var).
    pub const VAR_OUT_SENSOR_CT1: u16 = 0x8217;
    /// Outdoor unit error code (var).
    pub const VAR_OUT_ERROR_CODE: u16 = 0x8235;
    /// Instantaneous power, one-minute sum in watts (long var).
    pub const LVAR_OUT_WATTMETER_1W_1MIN_SUM: u16 = 0x8413;
    /// Cumulative energy across all units, watt-hours (long var).
    pub const LVAR_OUT_WATTMETER_ALL_UNIT_ACCUM: u16 = 0x8414;
    /// Mains voltage (long var).
    pub const LVAR_NM_OUT_SENSOR_VOLTAGE: u16 = 0x24FC;
}

/// Payload kind, read from bits 9–10 of the message number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSetType {
    /// Single byte.
    Enum,
    /// 16-bit unsigned, big-endian.
    Variable,
    /// 32-bit unsigned, little-endian.
    LongVariable,
    /// Opaque variable-length payload.
    Structure,
}

impl MessageSetType {
    /// Classify a message number.
    pub fn of(number: u16) -> Self {
        match (number & 0x0600) >> 9 {
            0 => Self::Enum,
            1 => Self::Variable,
            2 => Self::LongVariable,
            _ => Self::Structure,
        }
    }
}

/// A decoded message payload. The variant always agrees with
/// [`MessageSetType::of`] the carrying number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// One-byte enumerated value.
    Enum(u8),
    /// 16-bit reading; widen with [`widen_signed`] where the sensor is
    /// known to report signed values.
    Variable(u16),
    /// 32-bit reading.
    LongVariable(u32),
    /// Raw structure payload, at most 253 bytes.
    Structure(Bytes),
}

impl Value {
    /// The reading as a float, if this value carries a number.
    ///
    /// Structures have no scalar interpretation and yield `None`.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Enum(v) => Some(f32::from(*v)),
            Value::Variable(v) => Some(f32::from(*v)),
            Value::LongVariable(v) => Some(*v as f32),
            Value::Structure(_) => None,
        }
    }
}

/// Largest structure payload that fits a frame.
pub const MAX_STRUCTURE_PAYLOAD: usize = 253;

/// One message number paired with its decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSet {
    /// The 16-bit message number.
    pub number: u16,
    /// The payload.
    pub value: Value,
}

/// What went wrong while pulling one message set out of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDecodeIssue {
    /// The payload runs past the end of the message region.
    Truncated,
    /// A structure message inside a multi-message packet; its length is
    /// undefined there, so it cannot be decoded.
    StructureNotAlone {
        /// The packet's declared message count.
        capacity: u8,
    },
}

impl MessageSet {
    /// Build a message set, picking the value variant the number demands.
    ///
    /// `raw` is truncated to the payload width for Enum/Variable messages;
    /// use [`Value::Structure`] directly for structures.
    pub fn numeric(number: u16, raw: u32) -> Self {
        let value = match MessageSetType::of(number) {
            MessageSetType::Enum => Value::Enum(raw as u8),
            MessageSetType::Variable => Value::Variable(raw as u16),
            MessageSetType::LongVariable | MessageSetType::Structure => Value::LongVariable(raw),
        };
        Self { number, value }
    }

    /// Payload kind of this message.
    #[inline]
    pub fn set_type(&self) -> MessageSetType {
        MessageSetType::of(self.number)
    }

    /// Decode one message set from `region` at `offset`.
    ///
    /// `region` is the message area of a frame: everything between the
    /// count byte and the CRC. `capacity` is the packet's declared message
    /// count, needed to validate structure messages. Returns the message
    /// and the number of bytes it occupied.
    pub fn decode(
        region: &[u8],
        offset: usize,
        capacity: u8,
    ) -> Result<(Self, usize), MessageDecodeIssue> {
        let avail = region.len().saturating_sub(offset);
        if avail < 2 {
            return Err(MessageDecodeIssue::Truncated);
        }
        let number = u16::from_be_bytes([region[offset], region[offset + 1]]);
        let body = &region[offset + 2..];

        let (value, size) = match MessageSetType::of(number) {
            MessageSetType::Enum => {
                if body.is_empty() {
                    return Err(MessageDecodeIssue::Truncated);
                }
                (Value::Enum(body[0]), 3)
            }
            MessageSetType::Variable => {
                if body.len() < 2 {
                    return Err(MessageDecodeIssue::Truncated);
                }
                (Value::Variable(u16::from_be_bytes([body[0], body[1]])), 4)
            }
            MessageSetType::LongVariable => {
                if body.len() < 4 {
                    return Err(MessageDecodeIssue::Truncated);
                }
                (
                    Value::LongVariable(u32::from_le_bytes([body[0], body[1], body[2], body[3]])),
                    6,
                )
            }
            MessageSetType::Structure => {
                if capacity != 1 {
                    return Err(MessageDecodeIssue::StructureNotAlone { capacity });
                }
                // The payload runs to the end of the message region.
                (
                    Value::Structure(Bytes::copy_from_slice(body)),
                    2 + body.len(),
                )
            }
        };

        Ok((Self { number, value }, size))
    }

    /// Append this message's wire bytes to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.number.to_be_bytes());
        match &self.value {
            Value::Enum(v) => out.push(*v),
            Value::Variable(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::LongVariable(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Structure(bytes) => out.extend_from_slice(bytes),
        }
    }
}

/// Widen a 16-bit variable reading to a signed value, two's-complement.
#[inline]
pub fn widen_signed(value: u16) -> i32 {
    i32::from(value as i16)
}

/// The widening rule the original firmware shipped with: only 0xFFFF maps
/// to a negative number (−1); every other reading passes through unsigned.
///
/// Kept selectable because deployed controllers were calibrated against it,
/// but it mangles every real sub-zero reading except −0.1 °C.
#[inline]
pub fn widen_signed_legacy(value: u16) -> i32 {
    let value = i32::from(value);
    if value < 0xFFFF {
        value
    } else {
        value - 0x10000
    }
}
