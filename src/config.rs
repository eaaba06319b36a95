//! Bridge configuration.
//!
//! Everything here is policy, not protocol: the wire format constants live
//! in [`crate::protocol::wire_format`]. These knobs control how aggressively
//! the bridge reads, how long it waits for silence, ACKs and state
//! confirmation, and how the command queue retries and reaps.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the bridge core.
///
/// The defaults reproduce the timings the bus was characterised with; they
/// are safe for a 9600-baud half-duplex link. All durations are in
/// milliseconds of the transport's monotonic clock.
///
/// # Example
///
/// ```
/// use nasa_bridge::config::BridgeConfig;
///
/// let config = BridgeConfig {
///     silence_timeout_ms: 250,
///     ..BridgeConfig::default()
/// };
/// assert_eq!(config.read_chunk_limit, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum bytes drained from the transport per tick.
    pub read_chunk_limit: usize,
    /// Clear the reassembly buffer after this long without a byte.
    pub silence_timeout_ms: u64,
    /// A device is online if it was heard from within this window.
    pub device_timeout_ms: u64,
    /// How long a sent command waits for an ACK.
    pub ack_timeout_ms: u64,
    /// Extra delay past the ACK timeout before re-transmitting.
    pub retry_delay_ms: u64,
    /// Transmission attempts before a command fails.
    pub max_retries: u8,
    /// How long an acknowledged command waits for the device state to
    /// reflect the request before being completed anyway.
    pub confirm_timeout_ms: u64,
    /// Minimum spacing between queue cleanup sweeps.
    pub cleanup_interval_ms: u64,
    /// Failed/completed commands are reaped once this old.
    pub reap_age_ms: u64,
    /// Enqueue limit; submissions beyond this are rejected.
    pub max_queue_depth: usize,
    /// Use the historical sign-widening rule for signed VAR readings.
    ///
    /// The historical rule treats only 0xFFFF as negative, which is almost
    /// certainly a defect in the firmware this bridge impersonates. Off by
    /// default; see [`crate::protocol::message::widen_signed_legacy`].
    pub legacy_sign_widening: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_chunk_limit: 64,
            silence_timeout_ms: 500,
            device_timeout_ms: 300_000,
            ack_timeout_ms: 1_000,
            retry_delay_ms: 500,
            max_retries: 3,
            confirm_timeout_ms: 3_000,
            cleanup_interval_ms: 5_000,
            reap_age_ms: 10_000,
            max_queue_depth: 64,
            legacy_sign_widening: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_bus_characterisation() {
        let config = BridgeConfig::default();
        assert_eq!(config.read_chunk_limit, 64);
        assert_eq!(config.silence_timeout_ms, 500);
        assert_eq!(config.device_timeout_ms, 300_000);
        assert_eq!(config.ack_timeout_ms, 1_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.reap_age_ms, 10_000);
        assert!(!config.legacy_sign_widening);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"silence_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.silence_timeout_ms, 250);
        assert_eq!(config.read_chunk_limit, 64);
        assert_eq!(config.max_queue_depth, 64);
    }

    #[test]
    fn test_roundtrip_through_json() {
        let config = BridgeConfig {
            legacy_sign_widening: true,
            max_queue_depth: 8,
            ..BridgeConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
