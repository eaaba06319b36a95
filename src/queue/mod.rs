//! Command queue and retry state machine.
//!
//! Reliable delivery over a bus with no delivery guarantees: a command is
//! transmitted, re-transmitted on ACK silence, matched against its ACK by
//! packet number, and finally confirmed by watching the device actually
//! report the requested state. Timeline for one command:
//!
//! ```text
//! enqueue   send        ACK          state notification     reap
//!   │        │           │                  │                │
//!   Pending ─▶ Sent ─────▶ Acknowledged ───▶ Completed ──────▶ (gone)
//!              │ no ACK in ack_timeout + retry_delay
//!              ├────────▶ Pending (again, while retries remain)
//!              └────────▶ Failed  (retries exhausted)
//! ```
//!
//! The queue holds commands in submission order and offers at most one for
//! transmission per call; the bridge enforces one send per tick. It never
//! coalesces duplicates — each submission gets its own delivery attempt —
//! but depth is capped so a misbehaving client cannot grow it without
//! bound.

pub mod command;

use tracing::{debug, warn};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::protocol::wire_format::Address;
use crate::state::types::ControlRequest;
use crate::state::DeviceState;
pub use command::{CommandState, ExpectedState, QueuedCommand, TEMP_TOLERANCE};

/// Ordered command queue with retry, ACK, and confirmation tracking.
#[derive(Debug)]
pub struct CommandQueue {
    commands: Vec<QueuedCommand>,
    /// Next packet number to stamp on a transmission. Wraps past 255
    /// skipping 0, so 0 never appears on the wire as one of ours.
    next_sequence: u8,
    last_cleanup_ms: u64,
    ack_timeout_ms: u64,
    retry_delay_ms: u64,
    max_retries: u8,
    confirm_timeout_ms: u64,
    cleanup_interval_ms: u64,
    reap_age_ms: u64,
    max_depth: usize,
}

impl CommandQueue {
    /// Create a queue with the given policy.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            commands: Vec::new(),
            next_sequence: 1,
            last_cleanup_ms: 0,
            ack_timeout_ms: config.ack_timeout_ms,
            retry_delay_ms: config.retry_delay_ms,
            max_retries: config.max_retries,
            confirm_timeout_ms: config.confirm_timeout_ms,
            cleanup_interval_ms: config.cleanup_interval_ms,
            reap_age_ms: config.reap_age_ms,
            max_depth: config.max_queue_depth,
        }
    }

    /// Append a command. Duplicates are not coalesced; every submission is
    /// delivered independently.
    pub fn enqueue(&mut self, address: Address, request: ControlRequest) -> Result<(), BridgeError> {
        if self.commands.len() >= self.max_depth {
            return Err(BridgeError::QueueFull {
                depth: self.max_depth,
            });
        }
        self.commands.push(QueuedCommand::new(address, request));
        debug!(address = %address, depth = self.commands.len(), "command queued");
        Ok(())
    }

    /// Take the next packet number, wrapping 255 → 1.
    pub fn allocate_sequence(&mut self) -> u8 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        if self.next_sequence == 0 {
            self.next_sequence = 1;
        }
        sequence
    }

    /// Find the next command due for transmission, advancing timed-out
    /// commands through their state transitions along the way.
    ///
    /// Front-to-back scan; the first command allowed to send wins. Returns
    /// an index valid until the next mutation of the queue.
    pub fn next_to_send(&mut self, now_ms: u64) -> Option<usize> {
        for (index, cmd) in self.commands.iter_mut().enumerate() {
            match cmd.state {
                CommandState::Pending => return Some(index),
                CommandState::Sent => {
                    let waited = now_ms.saturating_sub(cmd.sent_time_ms);
                    if waited > self.ack_timeout_ms {
                        if cmd.retry_count < self.max_retries {
                            if waited > self.ack_timeout_ms + self.retry_delay_ms {
                                debug!(
                                    address = %cmd.address,
                                    attempt = cmd.retry_count + 1,
                                    max = self.max_retries,
                                    "no ACK, retrying command"
                                );
                                cmd.state = CommandState::Pending;
                                return Some(index);
                            }
                        } else {
                            warn!(address = %cmd.address, "command failed, retries exhausted");
                            cmd.state = CommandState::Failed;
                            cmd.sent_time_ms = now_ms;
                        }
                    }
                }
                CommandState::Acknowledged => {
                    if now_ms.saturating_sub(cmd.sent_time_ms) > self.confirm_timeout_ms {
                        debug!(
                            address = %cmd.address,
                            "acknowledged but state never confirmed, completing anyway"
                        );
                        cmd.state = CommandState::Completed;
                        cmd.sent_time_ms = now_ms;
                    }
                }
                CommandState::Failed | CommandState::Completed => {}
            }
        }
        None
    }

    /// Borrow the command at `index`.
    pub fn command(&self, index: usize) -> &QueuedCommand {
        &self.commands[index]
    }

    /// Record a transmission of the command at `index` under `sequence`.
    pub fn mark_sent(&mut self, index: usize, sequence: u8, now_ms: u64) {
        let cmd = &mut self.commands[index];
        cmd.state = CommandState::Sent;
        cmd.sent_time_ms = now_ms;
        cmd.sequence = sequence;
        cmd.retry_count += 1;
        debug!(address = %cmd.address, sequence, attempt = cmd.retry_count, "command sent");
    }

    /// Route an inbound ACK by packet number.
    ///
    /// First `Sent` command with a matching sequence wins, so if numbers
    /// ever wrap with 255 commands outstanding, the oldest claim holds.
    /// The ACK restarts the command's clock for the confirmation window.
    pub fn handle_ack(&mut self, sequence: u8, now_ms: u64) {
        for cmd in &mut self.commands {
            if cmd.state == CommandState::Sent && cmd.sequence == sequence {
                debug!(address = %cmd.address, sequence, "command acknowledged");
                cmd.state = CommandState::Acknowledged;
                cmd.sent_time_ms = now_ms;
                return;
            }
        }
        warn!(sequence, "ACK for unknown sequence, dropping");
    }

    /// Confirmation probe: promote acknowledged commands for `address`
    /// whose expectations the observed state now satisfies.
    ///
    /// Called after every state-store mutation.
    pub fn check_confirmation(&mut self, address: &str, state: &DeviceState, now_ms: u64) {
        for cmd in &mut self.commands {
            if cmd.state != CommandState::Acknowledged || cmd.address.to_string() != address {
                continue;
            }
            if cmd.expected.matches(state) {
                debug!(address, "device state confirmed, command completed");
                cmd.state = CommandState::Completed;
                cmd.sent_time_ms = now_ms;
            }
        }
    }

    /// Reap old terminal commands, at most once per cleanup interval.
    pub fn maybe_cleanup(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_cleanup_ms) < self.cleanup_interval_ms {
            return;
        }
        self.last_cleanup_ms = now_ms;
        let reap_age = self.reap_age_ms;
        let before = self.commands.len();
        self.commands.retain(|cmd| {
            cmd.open() || now_ms.saturating_sub(cmd.sent_time_ms) < reap_age
        });
        if self.commands.len() != before {
            debug!(reaped = before - self.commands.len(), "cleaned up finished commands");
        }
    }

    /// Commands not yet acknowledged (Pending or Sent).
    pub fn pending_count(&self) -> usize {
        self.commands.iter().filter(|cmd| cmd.in_flight()).count()
    }

    /// Is any command still open for `address`?
    pub fn has_commands_for(&self, address: &str) -> bool {
        self.commands
            .iter()
            .any(|cmd| cmd.open() && cmd.address.to_string() == address)
    }

    /// Total commands held, terminal ones included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no commands are held at all.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[cfg(test)]
    fn states(&self) -> Vec<CommandState> {
        self.commands.iter().map(|cmd| cmd.state).collect()
    }
}
