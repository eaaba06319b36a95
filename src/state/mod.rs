//! Device-state store and discovery registry.
//!
//! One [`DeviceState`] per bus address, created the first time the address
//! is heard from and never removed. The store is a passive map: the bridge
//! feeds it [`DeviceEvent`]s and reads snapshots back out; it performs no
//! I/O and holds no references to the queue or transport.

pub mod types;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::protocol::translator::{DeviceEvent, EventKind};
use crate::protocol::wire_format::Address;
use types::{FanMode, Mode, Preset};

/// Last observed state of one device.
///
/// Snapshots of this are what the network-facing layers serve, hence the
/// `Serialize` derive. Fields default to "never reported".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub power: bool,
    pub mode: Mode,
    pub target_temp: f32,
    pub room_temp: f32,
    pub outdoor_temp: f32,
    pub eva_in_temp: f32,
    pub eva_out_temp: f32,
    pub fan_mode: FanMode,
    pub swing_vertical: bool,
    pub swing_horizontal: bool,
    pub preset: Preset,
    pub error_code: i32,
    pub inst_power: f32,
    pub cumulative_energy: f32,
    pub current: f32,
    pub voltage: f32,
    /// Clock reading of the most recent message from this device.
    pub last_update_ms: u64,
    /// Raw reading of every numeric message ever seen from this device,
    /// keyed by message number. Unknown telemetry stays visible here.
    pub custom_sensors: BTreeMap<u16, f32>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            power: false,
            mode: Mode::Unknown,
            target_temp: 0.0,
            room_temp: 0.0,
            outdoor_temp: 0.0,
            eva_in_temp: 0.0,
            eva_out_temp: 0.0,
            fan_mode: FanMode::Unknown,
            swing_vertical: false,
            swing_horizontal: false,
            preset: Preset::None,
            error_code: 0,
            inst_power: 0.0,
            cumulative_energy: 0.0,
            current: 0.0,
            voltage: 0.0,
            last_update_ms: 0,
            custom_sensors: BTreeMap::new(),
        }
    }
}

/// Per-address state map plus the discovery set.
#[derive(Debug, Default)]
pub struct DeviceStore {
    devices: HashMap<String, DeviceState>,
    discovered: HashSet<String>,
}

impl DeviceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `address` was seen on the bus at `now_ms`.
    ///
    /// Creates the state entry if this is the first sighting.
    pub fn register(&mut self, address: Address, now_ms: u64) {
        let key = address.to_string();
        if self.discovered.insert(key.clone()) {
            debug!(address = %key, device_type = address.device_type(), "discovered device");
        }
        self.devices.entry(key).or_default().last_update_ms = now_ms;
    }

    /// Apply one observed event and stamp the device's last-update clock.
    ///
    /// Idempotent: applying the same event twice leaves the same snapshot
    /// (modulo the timestamp).
    pub fn apply(&mut self, event: &DeviceEvent, now_ms: u64) {
        let state = self.devices.entry(event.address.to_string()).or_default();
        state.last_update_ms = now_ms;
        match event.kind {
            EventKind::Power(v) => state.power = v,
            EventKind::Mode(v) => state.mode = v,
            EventKind::FanMode(v) => state.fan_mode = v,
            EventKind::SwingVertical(v) => state.swing_vertical = v,
            EventKind::SwingHorizontal(v) => state.swing_horizontal = v,
            EventKind::Preset(v) => state.preset = v,
            EventKind::RoomTemp(v) => state.room_temp = v,
            EventKind::TargetTemp(v) => state.target_temp = v,
            EventKind::OutdoorTemp(v) => state.outdoor_temp = v,
            EventKind::EvaInTemp(v) => state.eva_in_temp = v,
            EventKind::EvaOutTemp(v) => state.eva_out_temp = v,
            EventKind::ErrorCode(v) => state.error_code = v,
            EventKind::InstantPower(v) => state.inst_power = v,
            EventKind::CumulativeEnergy(v) => state.cumulative_energy = v,
            EventKind::Current(v) => state.current = v,
            EventKind::Voltage(v) => state.voltage = v,
            EventKind::CustomSensor { number, value } => {
                state.custom_sensors.insert(number, value);
            }
        }
    }

    /// Copy of the state for `address`, if it has ever been seen.
    pub fn snapshot(&self, address: &str) -> Option<DeviceState> {
        self.devices.get(address).cloned()
    }

    /// Borrow the state for `address`.
    pub fn get(&self, address: &str) -> Option<&DeviceState> {
        self.devices.get(address)
    }

    /// Has this address ever appeared as a packet source?
    pub fn is_known(&self, address: &str) -> bool {
        self.discovered.contains(address)
    }

    /// Was this device heard from within `timeout_ms` of `now_ms`?
    pub fn is_online(&self, address: &str, now_ms: u64, timeout_ms: u64) -> bool {
        self.devices
            .get(address)
            .map(|state| now_ms.saturating_sub(state.last_update_ms) < timeout_ms)
            .unwrap_or(false)
    }

    /// All discovered addresses, sorted for stable output.
    pub fn discovered(&self) -> Vec<String> {
        let mut list: Vec<String> = self.discovered.iter().cloned().collect();
        list.sort();
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::AddressClass;

    fn indoor() -> Address {
        Address::new(AddressClass::Indoor, 0, 0)
    }

    fn event(kind: EventKind) -> DeviceEvent {
        DeviceEvent {
            address: indoor(),
            kind,
        }
    }

    #[test]
    fn test_register_discovers_once() {
        let mut store = DeviceStore::new();
        assert!(!store.is_known("20.00.00"));
        store.register(indoor(), 100);
        store.register(indoor(), 200);
        assert!(store.is_known("20.00.00"));
        assert_eq!(store.discovered(), ["20.00.00"]);
        assert_eq!(store.snapshot("20.00.00").unwrap().last_update_ms, 200);
    }

    #[test]
    fn test_apply_creates_entry_lazily() {
        let mut store = DeviceStore::new();
        store.apply(&event(EventKind::Power(true)), 50);
        let state = store.snapshot("20.00.00").unwrap();
        assert!(state.power);
        assert_eq!(state.last_update_ms, 50);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut store = DeviceStore::new();
        let e = event(EventKind::RoomTemp(21.5));
        store.apply(&e, 10);
        let first = store.snapshot("20.00.00").unwrap();
        store.apply(&e, 10);
        assert_eq!(store.snapshot("20.00.00").unwrap(), first);
    }

    #[test]
    fn test_custom_sensor_accumulates() {
        let mut store = DeviceStore::new();
        store.apply(
            &event(EventKind::CustomSensor {
                number: 0x4242,
                value: 7.0,
            }),
            1,
        );
        store.apply(
            &event(EventKind::CustomSensor {
                number: 0x4243,
                value: 8.0,
            }),
            2,
        );
        store.apply(
            &event(EventKind::CustomSensor {
                number: 0x4242,
                value: 9.0,
            }),
            3,
        );
        let state = store.snapshot("20.00.00").unwrap();
        assert_eq!(state.custom_sensors.len(), 2);
        assert_eq!(state.custom_sensors[&0x4242], 9.0);
        assert_eq!(state.custom_sensors[&0x4243], 8.0);
    }

    #[test]
    fn test_online_window() {
        let mut store = DeviceStore::new();
        store.register(indoor(), 1_000);
        assert!(store.is_online("20.00.00", 1_000, 300_000));
        assert!(store.is_online("20.00.00", 300_999, 300_000));
        assert!(!store.is_online("20.00.00", 301_000, 300_000));
        assert!(!store.is_online("10.00.00", 1_000, 300_000));
    }

    #[test]
    fn test_entries_never_destroyed() {
        let mut store = DeviceStore::new();
        store.register(indoor(), 0);
        // Going offline does not remove the entry or its history.
        assert!(!store.is_online("20.00.00", 1_000_000, 300_000));
        assert!(store.is_known("20.00.00"));
        assert!(store.snapshot("20.00.00").is_some());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut store = DeviceStore::new();
        store.apply(&event(EventKind::TargetTemp(24.0)), 5);
        let json = serde_json::to_value(store.snapshot("20.00.00").unwrap()).unwrap();
        assert_eq!(json["target_temp"], 24.0);
        assert_eq!(json["mode"], "unknown");
    }
}
