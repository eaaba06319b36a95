//! Translation between packets and bridge-level meaning.
//!
//! Inbound, a decoded packet becomes either an ACK to route to the command
//! queue or a list of [`DeviceEvent`]s for the state store — plain data, no
//! callbacks, so the bridge keeps sole ownership of all mutable state and
//! tests can replay event streams directly.
//!
//! Outbound, a [`ControlRequest`] becomes a Request packet with a fixed
//! message order, so identical requests always encode to identical frames.

use tracing::trace;

use super::message::{msg, widen_signed, widen_signed_legacy, MessageSet, Value};
use super::packet::Packet;
use super::wire_format::{Address, DataType};
use crate::state::types::{ControlRequest, FanMode, Mode, Preset};

/// One observed fact about a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    Power(bool),
    Mode(Mode),
    FanMode(FanMode),
    SwingVertical(bool),
    SwingHorizontal(bool),
    Preset(Preset),
    RoomTemp(f32),
    TargetTemp(f32),
    OutdoorTemp(f32),
    EvaInTemp(f32),
    EvaOutTemp(f32),
    ErrorCode(i32),
    InstantPower(f32),
    CumulativeEnergy(f32),
    Current(f32),
    Voltage(f32),
    /// Any numeric reading, recognised or not, keyed by message number.
    CustomSensor { number: u16, value: f32 },
}

/// An [`EventKind`] attributed to its source device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceEvent {
    /// The device the fact is about.
    pub address: Address,
    /// The fact.
    pub kind: EventKind,
}

/// What an inbound packet means to the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Acknowledgement of a packet we sent. The packet number is the
    /// correlation id: NASA headers carry no separate sequence field, so
    /// the number stamped into an outgoing Request is what comes back here.
    Ack {
        /// The acknowledged packet number.
        packet_number: u8,
    },
    /// A notification carrying device state, already broken into events in
    /// wire order.
    Notification(Vec<DeviceEvent>),
    /// Anything else on the bus; the source still counts for discovery.
    Ignored,
}

/// Interpret a decoded packet.
///
/// `legacy_widening` selects the historical sign-widening rule for signed
/// temperature readings (see [`widen_signed_legacy`]).
pub fn interpret(packet: &Packet, legacy_widening: bool) -> Inbound {
    match packet.command.data_type {
        DataType::Ack => Inbound::Ack {
            packet_number: packet.command.packet_number,
        },
        DataType::Notification => {
            let mut events = Vec::with_capacity(2 * packet.messages.len());
            for message in &packet.messages {
                push_events(&mut events, packet.source, message, legacy_widening);
            }
            Inbound::Notification(events)
        }
        other => {
            trace!(data_type = ?other, source = %packet.source, "ignoring packet");
            Inbound::Ignored
        }
    }
}

/// Events for one message: always the raw custom-sensor reading first, then
/// the semantic interpretation if the number is known.
fn push_events(
    events: &mut Vec<DeviceEvent>,
    address: Address,
    message: &MessageSet,
    legacy_widening: bool,
) {
    let event = |kind| DeviceEvent { address, kind };

    if let Some(value) = message.value.as_f32() {
        events.push(event(EventKind::CustomSensor {
            number: message.number,
            value,
        }));
    }

    let signed = |raw: u16| {
        if legacy_widening {
            widen_signed_legacy(raw)
        } else {
            widen_signed(raw)
        }
    };

    match (message.number, &message.value) {
        (msg::ENUM_IN_OPERATION_POWER, Value::Enum(v)) => {
            events.push(event(EventKind::Power(*v != 0)));
        }
        (msg::ENUM_IN_OPERATION_MODE, Value::Enum(v)) => {
            events.push(event(EventKind::Mode(Mode::from_wire(*v))));
        }
        (msg::ENUM_IN_FAN_MODE, Value::Enum(v)) => {
            events.push(event(EventKind::FanMode(FanMode::from_wire(*v))));
        }
        (msg::ENUM_IN_FAN_MODE_REAL, Value::Enum(v)) => {
            events.push(event(EventKind::FanMode(FanMode::from_real(*v))));
        }
        (msg::ENUM_IN_LOUVER_HL_SWING, Value::Enum(v)) => {
            events.push(event(EventKind::SwingVertical(*v == 1)));
        }
        (msg::ENUM_IN_LOUVER_LR_SWING, Value::Enum(v)) => {
            events.push(event(EventKind::SwingHorizontal(*v == 1)));
        }
        (msg::ENUM_IN_ALT_MODE, Value::Enum(v)) => {
            events.push(event(EventKind::Preset(Preset::from_wire(*v))));
        }
        (msg::VAR_IN_TEMP_ROOM_F, Value::Variable(v)) => {
            events.push(event(EventKind::RoomTemp(f32::from(*v) / 10.0)));
        }
        (msg::VAR_IN_TEMP_TARGET_F, Value::Variable(v)) => {
            events.push(event(EventKind::TargetTemp(f32::from(*v) / 10.0)));
        }
        (msg::VAR_OUT_SENSOR_AIROUT, Value::Variable(v)) => {
            events.push(event(EventKind::OutdoorTemp(signed(*v) as f32 / 10.0)));
        }
        (msg::VAR_IN_TEMP_EVA_IN_F, Value::Variable(v)) => {
            events.push(event(EventKind::EvaInTemp(signed(*v) as f32 / 10.0)));
        }
        (msg::VAR_IN_TEMP_EVA_OUT_F, Value::Variable(v)) => {
            events.push(event(EventKind::EvaOutTemp(signed(*v) as f32 / 10.0)));
        }
        (msg::VAR_OUT_ERROR_CODE, Value::Variable(v)) => {
            events.push(event(EventKind::ErrorCode(i32::from(*v))));
        }
        (msg::VAR_OUT_SENSOR_CT1, Value::Variable(v)) => {
            events.push(event(EventKind::Current(f32::from(*v) / 10.0)));
        }
        (msg::LVAR_OUT_WATTMETER_1W_1MIN_SUM, Value::LongVariable(v)) => {
            events.push(event(EventKind::InstantPower(*v as f32)));
        }
        (msg::LVAR_OUT_WATTMETER_ALL_UNIT_ACCUM, Value::LongVariable(v)) => {
            events.push(event(EventKind::CumulativeEnergy(*v as f32)));
        }
        (msg::LVAR_NM_OUT_SENSOR_VOLTAGE, Value::LongVariable(v)) => {
            events.push(event(EventKind::Voltage(*v as f32)));
        }
        _ => {}
    }
}

/// Build the Request packet for a control request, or `None` if the request
/// sets nothing (nothing would change, so nothing is transmitted).
///
/// Message order is fixed: mode, power, target temperature, fan mode,
/// vertical swing, horizontal swing, preset. Setting a mode without an
/// explicit power choice also powers the unit on — a mode change on a unit
/// that stays off would be invisible.
pub fn build_request(
    destination: Address,
    request: &ControlRequest,
    packet_number: u8,
) -> Option<Packet> {
    let mut packet = Packet::outgoing(destination, DataType::Request, packet_number);

    let mut power = request.power;
    if let Some(mode) = request.mode {
        power = power.or(Some(true));
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_OPERATION_MODE,
            u32::from(mode.to_wire()),
        ));
    }
    if let Some(on) = power {
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_OPERATION_POWER,
            u32::from(on),
        ));
    }
    if let Some(temp) = request.target_temp {
        packet.messages.push(MessageSet::numeric(
            msg::VAR_IN_TEMP_TARGET_F,
            (temp * 10.0).round() as u32,
        ));
    }
    if let Some(fan) = request.fan_mode {
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_FAN_MODE,
            u32::from(fan.to_wire()),
        ));
    }
    if let Some(swing) = request.swing_vertical {
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_LOUVER_HL_SWING,
            u32::from(swing),
        ));
    }
    if let Some(swing) = request.swing_horizontal {
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_LOUVER_LR_SWING,
            u32::from(swing),
        ));
    }
    if let Some(preset) = request.preset {
        packet.messages.push(MessageSet::numeric(
            msg::ENUM_IN_ALT_MODE,
            u32::from(preset.to_wire()),
        ));
    }

    if packet.messages.is_empty() {
        None
    } else {
        Some(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire_format::{AddressClass, Command};

    fn indoor() -> Address {
        Address::new(AddressClass::Indoor, 0, 0)
    }

    fn notification(messages: Vec<MessageSet>) -> Packet {
        Packet {
            source: indoor(),
            destination: Address::local(),
            command: Command::outgoing(DataType::Notification, 5),
            messages,
        }
    }

    fn semantic_events(packet: &Packet) -> Vec<EventKind> {
        match interpret(packet, false) {
            Inbound::Notification(events) => events
                .into_iter()
                .map(|e| e.kind)
                .filter(|k| !matches!(k, EventKind::CustomSensor { .. }))
                .collect(),
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_ack_routes_packet_number() {
        let mut packet = notification(vec![]);
        packet.command.data_type = DataType::Ack;
        packet.command.packet_number = 42;
        assert_eq!(interpret(&packet, false), Inbound::Ack { packet_number: 42 });
    }

    #[test]
    fn test_non_notification_ignored() {
        let mut packet = notification(vec![MessageSet::numeric(msg::ENUM_IN_OPERATION_POWER, 1)]);
        packet.command.data_type = DataType::Response;
        assert_eq!(interpret(&packet, false), Inbound::Ignored);
    }

    #[test]
    fn test_every_message_yields_custom_sensor() {
        let packet = notification(vec![
            MessageSet::numeric(msg::ENUM_IN_OPERATION_POWER, 1),
            MessageSet::numeric(0x4242, 77), // unrecognised number
        ]);
        let Inbound::Notification(events) = interpret(&packet, false) else {
            panic!("expected notification");
        };
        let sensors: Vec<_> = events
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::CustomSensor { number, value } => Some((number, value)),
                _ => None,
            })
            .collect();
        assert_eq!(sensors, [(msg::ENUM_IN_OPERATION_POWER, 1.0), (0x4242, 77.0)]);
    }

    #[test]
    fn test_temperature_scaling() {
        let packet = notification(vec![
            MessageSet::numeric(msg::VAR_IN_TEMP_ROOM_F, 231),
            MessageSet::numeric(msg::VAR_IN_TEMP_TARGET_F, 240),
        ]);
        assert_eq!(
            semantic_events(&packet),
            [EventKind::RoomTemp(23.1), EventKind::TargetTemp(24.0)]
        );
    }

    #[test]
    fn test_outdoor_temperature_signed() {
        // -5.3 degrees as a two's-complement reading.
        let packet = notification(vec![MessageSet::numeric(msg::VAR_OUT_SENSOR_AIROUT, 0xFFCB)]);
        assert_eq!(semantic_events(&packet), [EventKind::OutdoorTemp(-5.3)]);
    }

    #[test]
    fn test_outdoor_temperature_legacy_widening() {
        let packet = notification(vec![MessageSet::numeric(msg::VAR_OUT_SENSOR_AIROUT, 0xFFCB)]);
        let Inbound::Notification(events) = interpret(&packet, true) else {
            panic!("expected notification");
        };
        // The legacy rule keeps the raw reading positive: 65483 / 10.
        let kinds: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::OutdoorTemp(_)))
            .collect();
        assert_eq!(kinds.len(), 1);
        assert_eq!(kinds[0].kind, EventKind::OutdoorTemp(6548.3));
    }

    #[test]
    fn test_fan_mode_real_mapping() {
        let packet = notification(vec![MessageSet::numeric(msg::ENUM_IN_FAN_MODE_REAL, 12)]);
        assert_eq!(semantic_events(&packet), [EventKind::FanMode(FanMode::Auto)]);
    }

    #[test]
    fn test_electrical_readings() {
        let packet = notification(vec![
            MessageSet::numeric(msg::LVAR_OUT_WATTMETER_1W_1MIN_SUM, 1_250),
            MessageSet::numeric(msg::VAR_OUT_SENSOR_CT1, 45),
            MessageSet::numeric(msg::LVAR_NM_OUT_SENSOR_VOLTAGE, 230),
        ]);
        assert_eq!(
            semantic_events(&packet),
            [
                EventKind::InstantPower(1250.0),
                EventKind::Current(4.5),
                EventKind::Voltage(230.0),
            ]
        );
    }

    #[test]
    fn test_build_request_full_order() {
        let request = ControlRequest {
            power: Some(true),
            mode: Some(Mode::Heat),
            target_temp: Some(23.5),
            fan_mode: Some(FanMode::High),
            swing_vertical: Some(true),
            swing_horizontal: Some(false),
            preset: Some(Preset::Windfree),
        };
        let packet = build_request(indoor(), &request, 9).unwrap();
        let numbers: Vec<u16> = packet.messages.iter().map(|m| m.number).collect();
        assert_eq!(
            numbers,
            [
                msg::ENUM_IN_OPERATION_MODE,
                msg::ENUM_IN_OPERATION_POWER,
                msg::VAR_IN_TEMP_TARGET_F,
                msg::ENUM_IN_FAN_MODE,
                msg::ENUM_IN_LOUVER_HL_SWING,
                msg::ENUM_IN_LOUVER_LR_SWING,
                msg::ENUM_IN_ALT_MODE,
            ]
        );
        assert_eq!(packet.messages[2].value, Value::Variable(235));
        assert_eq!(packet.messages[6].value, Value::Enum(9));
        assert_eq!(packet.command.data_type, DataType::Request);
        assert_eq!(packet.command.packet_number, 9);
        assert_eq!(packet.source, Address::local());
    }

    #[test]
    fn test_mode_implies_power_on() {
        let request = ControlRequest {
            mode: Some(Mode::Cool),
            ..Default::default()
        };
        let packet = build_request(indoor(), &request, 1).unwrap();
        assert_eq!(packet.messages.len(), 2);
        assert_eq!(packet.messages[0].number, msg::ENUM_IN_OPERATION_MODE);
        assert_eq!(packet.messages[0].value, Value::Enum(1));
        assert_eq!(packet.messages[1].number, msg::ENUM_IN_OPERATION_POWER);
        assert_eq!(packet.messages[1].value, Value::Enum(1));
    }

    #[test]
    fn test_explicit_power_off_wins_over_mode() {
        let request = ControlRequest {
            mode: Some(Mode::Cool),
            power: Some(false),
            ..Default::default()
        };
        let packet = build_request(indoor(), &request, 1).unwrap();
        assert_eq!(packet.messages[1].value, Value::Enum(0));
    }

    #[test]
    fn test_target_temp_rounding() {
        let request = ControlRequest {
            target_temp: Some(22.46),
            ..Default::default()
        };
        let packet = build_request(indoor(), &request, 1).unwrap();
        assert_eq!(packet.messages[0].value, Value::Variable(225));
    }

    #[test]
    fn test_empty_request_suppressed() {
        assert!(build_request(indoor(), &ControlRequest::default(), 1).is_none());
    }
}
