//! # nasa-bridge
//!
//! Core of a bridge between a Samsung NASA HVAC bus (a half-duplex serial
//! link) and higher-level clients. Three concerns live here:
//!
//! - **Frame codec** — NASA packets to and from raw bytes, with CRC-16
//!   validation and typed message payloads ([`protocol`]).
//! - **Stream reassembly** — whole packets out of a fragmented, noisy byte
//!   stream, resynchronising on the start marker and on bus silence
//!   ([`protocol::frame_buffer`]).
//! - **Command delivery** — a queue that sends state-change requests,
//!   retries on ACK silence, and confirms the device actually did what it
//!   was told ([`queue`]).
//!
//! The physical serial port stays outside: the core drives a [`transport::Transport`]
//! — non-blocking byte I/O plus a monotonic clock — and does all its work
//! in bounded, cooperative [`Bridge::tick`] calls on a single thread.
//!
//! ## Example
//!
//! ```
//! use nasa_bridge::{Bridge, BridgeConfig, ControlRequest};
//! use nasa_bridge::state::types::Mode;
//! use nasa_bridge::transport::MockTransport;
//!
//! let mut bridge = Bridge::new(BridgeConfig::default());
//! let mut port = MockTransport::new(); // a real host wraps its serial driver
//!
//! // Called on a timer; drains bytes, advances the queue.
//! bridge.tick(&mut port).unwrap();
//!
//! // Once a unit has been heard from, it can be commanded.
//! for address in bridge.list_devices() {
//!     bridge.submit(&address, ControlRequest {
//!         mode: Some(Mode::Cool),
//!         target_temp: Some(23.0),
//!         ..Default::default()
//!     }).unwrap();
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod state;
pub mod transport;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, DecodeError, Result};
pub use state::types::ControlRequest;
pub use state::DeviceState;
