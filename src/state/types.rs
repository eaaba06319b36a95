//! Climate vocabulary: modes, fan speeds, presets, and the control request.
//!
//! The integer mappings are Samsung's, lifted from bus captures. Everything
//! here derives `serde` so the network-facing layers can pass requests and
//! snapshots through unchanged.

use serde::{Deserialize, Serialize};

/// Operation mode as the indoor unit reports and accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    Cool,
    Dry,
    Fan,
    Heat,
    /// Reported value outside the known table.
    Unknown,
}

impl Mode {
    /// Map a bus value to a mode.
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Auto,
            1 => Self::Cool,
            2 => Self::Dry,
            3 => Self::Fan,
            4 => Self::Heat,
            _ => Self::Unknown,
        }
    }

    /// Bus value for this mode. `Unknown` degrades to Auto.
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Auto | Self::Unknown => 0,
            Self::Cool => 1,
            Self::Dry => 2,
            Self::Fan => 3,
            Self::Heat => 4,
        }
    }
}

/// Fan speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    Auto,
    Low,
    Mid,
    High,
    Turbo,
    Off,
    /// Reported value outside the known table.
    Unknown,
}

impl FanMode {
    /// Map the commanded-fan-mode message value (0..=4).
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Auto,
            1 => Self::Low,
            2 => Self::Mid,
            3 => Self::High,
            4 => Self::Turbo,
            _ => Self::Unknown,
        }
    }

    /// Map the real-fan-mode message value, which uses an extended table:
    /// 10..=15 are the auto sub-speeds, 254 is the fan fully stopped.
    pub fn from_real(value: u8) -> Self {
        match value {
            1 => Self::Low,
            2 => Self::Mid,
            3 => Self::High,
            4 => Self::Turbo,
            10..=15 => Self::Auto,
            254 => Self::Off,
            _ => Self::Unknown,
        }
    }

    /// Bus value when commanding this speed. Anything the unit cannot be
    /// told to do (`Off`, `Unknown`) degrades to Auto.
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Mid => 2,
            Self::High => 3,
            Self::Turbo => 4,
            _ => 0,
        }
    }
}

/// Comfort preset, carried by the alt-mode message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    None,
    Sleep,
    Quiet,
    Fast,
    Longreach,
    Eco,
    Windfree,
}

impl Preset {
    /// Map a bus value to a preset; unassigned codes read as `None`.
    pub fn from_wire(value: u8) -> Self {
        match value {
            1 => Self::Sleep,
            2 => Self::Quiet,
            3 => Self::Fast,
            6 => Self::Longreach,
            7 => Self::Eco,
            9 => Self::Windfree,
            _ => Self::None,
        }
    }

    /// Bus value for this preset.
    pub fn to_wire(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Sleep => 1,
            Self::Quiet => 2,
            Self::Fast => 3,
            Self::Longreach => 6,
            Self::Eco => 7,
            Self::Windfree => 9,
        }
    }
}

/// A state-change request: any subset of the controllable fields.
///
/// Unset fields are left alone on the device. An entirely empty request is
/// legal to submit but produces no bus traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlRequest {
    /// Turn the unit on or off.
    pub power: Option<bool>,
    /// Change operation mode. Also powers the unit on unless `power` says
    /// otherwise.
    pub mode: Option<Mode>,
    /// Target temperature in degrees.
    pub target_temp: Option<f32>,
    /// Fan speed.
    pub fan_mode: Option<FanMode>,
    /// Vertical louver swing.
    pub swing_vertical: Option<bool>,
    /// Horizontal louver swing.
    pub swing_horizontal: Option<bool>,
    /// Comfort preset.
    pub preset: Option<Preset>,
}

impl ControlRequest {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_wire_roundtrip() {
        for mode in [Mode::Auto, Mode::Cool, Mode::Dry, Mode::Fan, Mode::Heat] {
            assert_eq!(Mode::from_wire(mode.to_wire()), mode);
        }
        assert_eq!(Mode::from_wire(9), Mode::Unknown);
        assert_eq!(Mode::Unknown.to_wire(), 0);
    }

    #[test]
    fn test_fan_mode_real_table() {
        assert_eq!(FanMode::from_real(1), FanMode::Low);
        assert_eq!(FanMode::from_real(4), FanMode::Turbo);
        for sub in 10..=15 {
            assert_eq!(FanMode::from_real(sub), FanMode::Auto);
        }
        assert_eq!(FanMode::from_real(254), FanMode::Off);
        assert_eq!(FanMode::from_real(99), FanMode::Unknown);
    }

    #[test]
    fn test_fan_mode_to_wire_degrades_to_auto() {
        assert_eq!(FanMode::Off.to_wire(), 0);
        assert_eq!(FanMode::Unknown.to_wire(), 0);
        assert_eq!(FanMode::Turbo.to_wire(), 4);
    }

    #[test]
    fn test_preset_codes() {
        assert_eq!(Preset::from_wire(9), Preset::Windfree);
        assert_eq!(Preset::from_wire(6), Preset::Longreach);
        assert_eq!(Preset::from_wire(4), Preset::None);
        assert_eq!(Preset::Eco.to_wire(), 7);
    }

    #[test]
    fn test_request_is_empty() {
        assert!(ControlRequest::default().is_empty());
        let request = ControlRequest {
            power: Some(true),
            ..Default::default()
        };
        assert!(!request.is_empty());
    }

    #[test]
    fn test_request_json_shape() {
        let request: ControlRequest =
            serde_json::from_str(r#"{"mode": "cool", "target_temp": 22.5}"#).unwrap();
        assert_eq!(request.mode, Some(Mode::Cool));
        assert_eq!(request.target_temp, Some(22.5));
        assert_eq!(request.power, None);
    }
}
