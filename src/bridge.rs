//! The bridge core: one object owning the store, the queue, and the
//! reassembler, driven by `tick`.
//!
//! A tick does bounded work and never blocks:
//! 1. drain available bytes and handle at most one decoded packet —
//!    register the source, route ACKs to the queue, apply notification
//!    events to the store and probe confirmations;
//! 2. offer at most one queued command to the bus;
//! 3. reap finished commands on the cleanup cadence.
//!
//! The transport is borrowed per tick, never stored. External surfaces
//! (HTTP, UDP) interact only through [`Bridge::submit`],
//! [`Bridge::snapshot`] and the query methods, on the same thread as
//! `tick`.

use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::protocol::translator::{build_request, interpret, Inbound};
use crate::protocol::wire_format::Address;
use crate::protocol::{FrameBuffer, Packet};
use crate::queue::CommandQueue;
use crate::state::types::ControlRequest;
use crate::state::{DeviceState, DeviceStore};
use crate::transport::Transport;

/// Bridge between the NASA bus and higher-level clients.
#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    frame_buffer: FrameBuffer,
    store: DeviceStore,
    queue: CommandQueue,
    /// Clock as of the latest tick; queries between ticks use this.
    now_ms: u64,
}

impl Bridge {
    /// Create a bridge with the given configuration.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            frame_buffer: FrameBuffer::new(config.read_chunk_limit, config.silence_timeout_ms),
            store: DeviceStore::new(),
            queue: CommandQueue::new(&config),
            now_ms: 0,
            config,
        }
    }

    /// Run one bounded unit of work against the transport.
    pub fn tick(&mut self, io: &mut dyn Transport) -> Result<()> {
        self.now_ms = io.now_ms();

        if let Some(packet) = self.frame_buffer.poll(io) {
            self.handle_packet(&packet);
        }

        self.pump_queue(io)?;
        self.queue.maybe_cleanup(self.now_ms);
        Ok(())
    }

    /// Queue a state-change request for a device.
    ///
    /// The device must have been discovered first — commanding an address
    /// nothing answers on would retry blind and always fail.
    pub fn submit(&mut self, address: &str, request: ControlRequest) -> Result<()> {
        let parsed = Address::parse(address)?;
        // Compare in canonical form so "20.0.0" and "20.00.00" agree.
        if !self.store.is_known(&parsed.to_string()) {
            return Err(BridgeError::UnknownDevice(address.to_string()));
        }
        self.queue.enqueue(parsed, request)
    }

    /// Copy of the last observed state for `address`.
    pub fn snapshot(&self, address: &str) -> Option<DeviceState> {
        self.store.snapshot(address)
    }

    /// All addresses ever seen as a packet source, sorted.
    pub fn list_devices(&self) -> Vec<String> {
        self.store.discovered()
    }

    /// Has `address` ever been seen on the bus?
    pub fn is_known(&self, address: &str) -> bool {
        self.store.is_known(address)
    }

    /// Was `address` heard from within the configured online window,
    /// relative to the clock at the latest tick?
    pub fn is_online(&self, address: &str) -> bool {
        self.store
            .is_online(address, self.now_ms, self.config.device_timeout_ms)
    }

    /// Device kind label for an address, if the address parses.
    pub fn device_type(&self, address: &str) -> Option<&'static str> {
        Address::parse(address).ok().map(|a| a.device_type())
    }

    /// Commands awaiting transmission or acknowledgement.
    pub fn pending_commands(&self) -> usize {
        self.queue.pending_count()
    }

    /// Is any command still open for `address`?
    pub fn has_commands_for(&self, address: &str) -> bool {
        self.queue.has_commands_for(address)
    }

    fn handle_packet(&mut self, packet: &Packet) {
        self.store.register(packet.source, self.now_ms);
        trace!(
            source = %packet.source,
            destination = %packet.destination,
            messages = packet.messages.len(),
            "packet received"
        );

        match interpret(packet, self.config.legacy_sign_widening) {
            Inbound::Ack { packet_number } => self.queue.handle_ack(packet_number, self.now_ms),
            Inbound::Notification(events) => {
                for event in &events {
                    self.store.apply(event, self.now_ms);
                    let key = event.address.to_string();
                    if let Some(state) = self.store.get(&key) {
                        self.queue.check_confirmation(&key, state, self.now_ms);
                    }
                }
            }
            Inbound::Ignored => {}
        }
    }

    /// Offer at most one command to the bus.
    fn pump_queue(&mut self, io: &mut dyn Transport) -> Result<()> {
        let Some(index) = self.queue.next_to_send(self.now_ms) else {
            return Ok(());
        };
        let (address, request) = {
            let cmd = self.queue.command(index);
            (cmd.address, cmd.request)
        };

        let sequence = self.queue.allocate_sequence();
        if let Some(packet) = build_request(address, &request, sequence) {
            let frame = packet.encode();
            // A write failure leaves the command Pending; the next tick
            // retries it without burning a retry attempt.
            io.write_all(&frame)?;
            debug!(address = %address, sequence, bytes = frame.len(), "request transmitted");
        } else {
            debug!(address = %address, "request sets nothing, transmission suppressed");
        }
        self.queue.mark_sent(index, sequence, self.now_ms);
        Ok(())
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}
