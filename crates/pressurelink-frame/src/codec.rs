use bytes::{Buf, BufMut, BytesMut};

use crate::command::{Command, ValveState};
use crate::error::DecodeError;
use crate::event::TelemetryEvent;

/// Every frame is exactly 8 bytes.
pub const FRAME_LEN: usize = 8;

/// One wire frame.
pub type RawFrame = [u8; FRAME_LEN];

/// Byte 0 of every host-to-controller command.
pub const OP_COMMAND: u8 = 0x06;
/// Byte 0 of a controller acknowledgement; byte 2 selects the kind.
pub const OP_ACK: u8 = 0x07;
pub const OP_ATMOSPHERE_PRESSURE: u8 = 0x08;
pub const OP_SUPPLY_PRESSURE: u8 = 0x09;
pub const OP_NODE_PRESSURE: u8 = 0x10;
/// Node pressure as emitted by development firmware builds.
pub const OP_NODE_PRESSURE_ALIAS: u8 = 0x03;

/// Byte 1 of a set-target command.
pub const TARGET_GROUP: u8 = 0x05;

/// Second-level codes (byte 2 of commands and acknowledgements).
pub const SUB_SET_TARGET: u8 = 0x07;
pub const SUB_MANUAL_ENTER: u8 = 0x09;
pub const SUB_MANUAL_EXIT: u8 = 0x0B;
pub const SUB_SENDING_MODE: u8 = 0x0D;
pub const SUB_VALVE: u8 = 0x0F;

/// Encode a set-target command.
///
/// Wire format:
/// ```text
/// ┌──────┬──────┬──────┬─────────┬────────────────────┐
/// │ 0x06 │ 0x05 │ 0x07 │ node_id │ pressure (f32 LE)  │
/// └──────┴──────┴──────┴─────────┴────────────────────┘
/// ```
pub fn encode_set_target_pressure(node_id: u8, pressure: f32) -> RawFrame {
    target_frame(OP_COMMAND, node_id, pressure)
}

/// Encode a manual-mode enter/exit command.
///
/// Enter and exit are distinct second-level codes, not a flag byte.
pub fn encode_set_manual_mode(node_id: u8, enabled: bool) -> RawFrame {
    let sub = if enabled {
        SUB_MANUAL_ENTER
    } else {
        SUB_MANUAL_EXIT
    };
    node_command(node_id, sub, &[])
}

/// Encode a valve command. Byte 3 is the valve state ordinal.
pub fn encode_set_valve(node_id: u8, valve_state: ValveState) -> RawFrame {
    node_command(node_id, SUB_VALVE, &[valve_state.ordinal()])
}

/// Encode a sending-mode command.
///
/// The period is big-endian (high byte first), unlike the little-endian
/// floats elsewhere in the protocol. The controller expects exactly this.
pub fn encode_set_sending_mode(node_id: u8, cyclic: bool, period_ms: u16) -> RawFrame {
    let [high, low] = period_ms.to_be_bytes();
    node_command(node_id, SUB_SENDING_MODE, &[u8::from(cyclic), high, low])
}

/// Encode any command with the current opcode table.
pub fn encode_command(command: &Command) -> RawFrame {
    match *command {
        Command::SetTargetPressure { node_id, pressure } => {
            encode_set_target_pressure(node_id, pressure)
        }
        Command::SetManualMode { node_id, enabled } => encode_set_manual_mode(node_id, enabled),
        Command::SetValve {
            node_id,
            valve_state,
        } => encode_set_valve(node_id, valve_state),
        Command::SetSendingMode {
            node_id,
            cyclic,
            cycle_period_ms,
        } => encode_set_sending_mode(node_id, cyclic, cycle_period_ms),
    }
}

/// Decode one frame with the current opcode table.
///
/// Only the first 8 bytes are examined. Unknown opcodes decode to
/// [`TelemetryEvent::Unknown`] so newer firmware cannot stall the host; an
/// acknowledgement with an unknown second-level code is an error.
pub fn decode(frame: &[u8]) -> Result<TelemetryEvent, DecodeError> {
    let frame = whole_frame(frame)?;
    match frame[0] {
        OP_ATMOSPHERE_PRESSURE => Ok(TelemetryEvent::AtmospherePressure(body_f32(frame))),
        OP_SUPPLY_PRESSURE => Ok(TelemetryEvent::SupplyPressure(body_f32(frame))),
        OP_NODE_PRESSURE | OP_NODE_PRESSURE_ALIAS => Ok(node_pressure(frame)),
        OP_ACK => acknowledgement(frame),
        opcode => Ok(TelemetryEvent::Unknown { opcode }),
    }
}

/// Take one complete frame off the front of `src`.
///
/// Returns `None` and leaves `src` untouched while fewer than 8 bytes are
/// buffered.
pub fn split_frame(src: &mut BytesMut) -> Option<RawFrame> {
    if src.len() < FRAME_LEN {
        return None;
    }
    let mut frame = [0u8; FRAME_LEN];
    src.copy_to_slice(&mut frame);
    Some(frame)
}

pub(crate) fn target_frame(opcode: u8, node_id: u8, pressure: f32) -> RawFrame {
    let mut frame = [0u8; FRAME_LEN];
    let mut dst = &mut frame[..];
    dst.put_slice(&[opcode, TARGET_GROUP, SUB_SET_TARGET, node_id]);
    dst.put_f32_le(pressure);
    frame
}

fn node_command(node_id: u8, sub: u8, args: &[u8]) -> RawFrame {
    let mut frame = [0u8; FRAME_LEN];
    let mut dst = &mut frame[..];
    dst.put_slice(&[OP_COMMAND, node_id, sub]);
    dst.put_slice(args);
    frame
}

pub(crate) fn whole_frame(frame: &[u8]) -> Result<&[u8], DecodeError> {
    if frame.len() < FRAME_LEN {
        return Err(DecodeError::ShortFrame { len: frame.len() });
    }
    Ok(&frame[..FRAME_LEN])
}

/// `f32` in bytes 1..5.
pub(crate) fn body_f32(frame: &[u8]) -> f32 {
    let mut body = &frame[1..5];
    body.get_f32_le()
}

/// Node id in byte 1, `f32` in bytes 2..6.
pub(crate) fn node_pressure(frame: &[u8]) -> TelemetryEvent {
    let mut body = &frame[1..6];
    let node_id = body.get_u8();
    let pressure = body.get_f32_le();
    TelemetryEvent::NodePressure { node_id, pressure }
}

fn acknowledgement(frame: &[u8]) -> Result<TelemetryEvent, DecodeError> {
    let status = frame[3];
    match frame[2] {
        SUB_MANUAL_ENTER => Ok(TelemetryEvent::ManualModeEnter(status)),
        SUB_MANUAL_EXIT => Ok(TelemetryEvent::ManualModeExit(status)),
        SUB_VALVE => Ok(TelemetryEvent::ValveFeedback(status)),
        subcode => Err(DecodeError::UnrecognizedSubframe { subcode }),
    }
}
