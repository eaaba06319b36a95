//! Queued command representation.

use crate::protocol::wire_format::Address;
use crate::state::types::{ControlRequest, FanMode, Mode, Preset};
use crate::state::DeviceState;

/// Where a command is in its delivery lifecycle.
///
/// The only legal transitions are:
/// Pending → Sent → {Pending (retry), Acknowledged, Failed} and
/// Acknowledged → Completed. Failed and Completed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Waiting for a send slot.
    Pending,
    /// Transmitted, waiting for an ACK.
    Sent,
    /// ACK received, waiting for the device state to change.
    Acknowledged,
    /// Retries exhausted without an ACK.
    Failed,
    /// Device state confirmed (or confirmation window elapsed).
    Completed,
}

/// How far temperatures may differ and still count as confirmed.
pub const TEMP_TOLERANCE: f32 = 0.1;

/// The device state a request is expected to produce, captured at enqueue
/// time. Only the fields the request actually set participate; louver
/// swing is excluded because units report swing state unreliably.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExpectedState {
    pub power: Option<bool>,
    pub mode: Option<Mode>,
    pub target_temp: Option<f32>,
    pub fan_mode: Option<FanMode>,
    pub preset: Option<Preset>,
}

impl ExpectedState {
    /// Capture the expectation a request creates.
    ///
    /// Note the mode-implies-power rule is a send-time concern; it is not
    /// reflected here, so a bare mode change is confirmed by the mode alone.
    pub fn of(request: &ControlRequest) -> Self {
        Self {
            power: request.power,
            mode: request.mode,
            target_temp: request.target_temp,
            fan_mode: request.fan_mode,
            preset: request.preset,
        }
    }

    /// Does `state` satisfy every expectation?
    pub fn matches(&self, state: &DeviceState) -> bool {
        if self.power.is_some_and(|v| v != state.power) {
            return false;
        }
        if self.mode.is_some_and(|v| v != state.mode) {
            return false;
        }
        if self
            .target_temp
            .is_some_and(|v| (v - state.target_temp).abs() > TEMP_TOLERANCE)
        {
            return false;
        }
        if self.fan_mode.is_some_and(|v| v != state.fan_mode) {
            return false;
        }
        if self.preset.is_some_and(|v| v != state.preset) {
            return false;
        }
        true
    }
}

/// One command in the queue.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    /// Device the command targets.
    pub address: Address,
    /// The request as submitted.
    pub request: ControlRequest,
    /// Lifecycle state.
    pub state: CommandState,
    /// Clock stamp of the most recent state-relevant event: last send,
    /// ACK arrival, or entry into a terminal state (which is what the
    /// reaper ages against).
    pub sent_time_ms: u64,
    /// Transmissions so far.
    pub retry_count: u8,
    /// Packet number used on the wire; the ACK correlation id.
    pub sequence: u8,
    /// Expectation captured at enqueue.
    pub expected: ExpectedState,
}

impl QueuedCommand {
    /// A freshly enqueued command.
    pub fn new(address: Address, request: ControlRequest) -> Self {
        Self {
            address,
            request,
            state: CommandState::Pending,
            sent_time_ms: 0,
            retry_count: 0,
            sequence: 0,
            expected: ExpectedState::of(&request),
        }
    }

    /// Is this command still occupying the bus (unsent or unacknowledged)?
    #[inline]
    pub fn in_flight(&self) -> bool {
        matches!(self.state, CommandState::Pending | CommandState::Sent)
    }

    /// Is this command still awaiting any kind of resolution?
    #[inline]
    pub fn open(&self) -> bool {
        matches!(
            self.state,
            CommandState::Pending | CommandState::Sent | CommandState::Acknowledged
        )
    }
}
