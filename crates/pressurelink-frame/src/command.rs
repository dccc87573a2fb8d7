//! Outbound controller commands and operator-input validation.
//!
//! The codec treats node ids as opaque bytes. Range checks happen here, at
//! the point where operator text becomes a [`Command`], so malformed input
//! never reaches the encoder.

use std::fmt;
use std::str::FromStr;

use crate::error::InputError;
use crate::event::StatusKind;

/// Lowest addressable node id.
pub const MIN_NODE_ID: u8 = 1;

/// Highest addressable node id.
pub const MAX_NODE_ID: u8 = 16;

/// Number of nodes on one controller bus.
pub const NODE_COUNT: usize = MAX_NODE_ID as usize;

/// Valve actuation requested by [`Command::SetValve`].
///
/// The discriminant is the wire ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValveState {
    CloseAll = 0,
    SlowEmpty = 1,
    FastEmpty = 2,
    MaxEmpty = 3,
    SlowFill = 4,
    FastFill = 5,
    MaxFill = 6,
}

impl ValveState {
    /// All states in wire order.
    pub const ALL: [ValveState; 7] = [
        ValveState::CloseAll,
        ValveState::SlowEmpty,
        ValveState::FastEmpty,
        ValveState::MaxEmpty,
        ValveState::SlowFill,
        ValveState::FastFill,
        ValveState::MaxFill,
    ];

    const NAMES: &'static str =
        "close-all, slow-empty, fast-empty, max-empty, slow-fill, fast-fill, max-fill";

    /// The byte sent on the wire.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Inverse of [`ordinal`](Self::ordinal).
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValveState::CloseAll => "close-all",
            ValveState::SlowEmpty => "slow-empty",
            ValveState::FastEmpty => "fast-empty",
            ValveState::MaxEmpty => "max-empty",
            ValveState::SlowFill => "slow-fill",
            ValveState::FastFill => "fast-fill",
            ValveState::MaxFill => "max-fill",
        }
    }
}

impl fmt::Display for ValveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValveState {
    type Err = InputError;

    /// Accepts `close-all`, `close_all` or `CloseAll` spellings, case-insensitively.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized: String = input
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|state| state.as_str().replace('-', "") == normalized)
            .ok_or_else(|| InputError::InvalidValveState {
                input: input.to_string(),
                expected: Self::NAMES,
            })
    }
}

/// A command sent from the host to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetTargetPressure {
        node_id: u8,
        pressure: f32,
    },
    SetManualMode {
        node_id: u8,
        enabled: bool,
    },
    SetValve {
        node_id: u8,
        valve_state: ValveState,
    },
    /// `cycle_period_ms` is meaningful only when `cyclic` is set; callers pass
    /// zero otherwise.
    SetSendingMode {
        node_id: u8,
        cyclic: bool,
        cycle_period_ms: u16,
    },
}

impl Command {
    /// The node this command addresses.
    pub fn node_id(&self) -> u8 {
        match *self {
            Command::SetTargetPressure { node_id, .. }
            | Command::SetManualMode { node_id, .. }
            | Command::SetValve { node_id, .. }
            | Command::SetSendingMode { node_id, .. } => node_id,
        }
    }

    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetTargetPressure { .. } => "set-target-pressure",
            Command::SetManualMode { .. } => "set-manual-mode",
            Command::SetValve { .. } => "set-valve",
            Command::SetSendingMode { .. } => "set-sending-mode",
        }
    }

    /// The status the controller answers this command with, if any.
    pub fn acknowledgement(&self) -> Option<StatusKind> {
        match *self {
            Command::SetManualMode { enabled: true, .. } => Some(StatusKind::ManualModeEnter),
            Command::SetManualMode { enabled: false, .. } => Some(StatusKind::ManualModeExit),
            Command::SetValve { .. } => Some(StatusKind::ValveFeedback),
            Command::SetTargetPressure { .. } | Command::SetSendingMode { .. } => None,
        }
    }

    /// Build a sending-mode command, forcing the period to zero when the
    /// controller should only report on request.
    pub fn sending_mode(node_id: u8, cyclic: bool, cycle_period_ms: u16) -> Self {
        Command::SetSendingMode {
            node_id,
            cyclic,
            cycle_period_ms: if cyclic { cycle_period_ms } else { 0 },
        }
    }
}

/// Parse operator text into a node id in `MIN_NODE_ID..=MAX_NODE_ID`.
pub fn parse_node_id(input: &str) -> Result<u8, InputError> {
    let value: u32 = input
        .trim()
        .parse()
        .map_err(|_| InputError::InvalidNodeId {
            input: input.to_string(),
        })?;

    match u8::try_from(value) {
        Ok(node_id) if (MIN_NODE_ID..=MAX_NODE_ID).contains(&node_id) => Ok(node_id),
        _ => Err(InputError::NodeOutOfRange {
            node_id: value,
            min: MIN_NODE_ID,
            max: MAX_NODE_ID,
        }),
    }
}

/// Parse operator text into a finite pressure value.
///
/// The codec would pass NaN and infinities through bit-for-bit; an operator
/// typing `inf` almost certainly did not mean it.
pub fn parse_pressure(input: &str) -> Result<f32, InputError> {
    let value: f32 = input
        .trim()
        .parse()
        .map_err(|_| InputError::InvalidPressure {
            input: input.to_string(),
        })?;

    if !value.is_finite() {
        return Err(InputError::NonFinitePressure {
            input: input.to_string(),
        });
    }
    Ok(value)
}

/// Parse operator text into a cycle period in milliseconds.
pub fn parse_period_ms(input: &str) -> Result<u16, InputError> {
    input
        .trim()
        .parse()
        .map_err(|_| InputError::InvalidPeriod {
            input: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgement_matches_command_kind() {
        let enter = Command::SetManualMode {
            node_id: 1,
            enabled: true,
        };
        let exit = Command::SetManualMode {
            node_id: 1,
            enabled: false,
        };
        let valve = Command::SetValve {
            node_id: 1,
            valve_state: ValveState::CloseAll,
        };
        assert_eq!(enter.acknowledgement(), Some(StatusKind::ManualModeEnter));
        assert_eq!(exit.acknowledgement(), Some(StatusKind::ManualModeExit));
        assert_eq!(valve.acknowledgement(), Some(StatusKind::ValveFeedback));
        assert_eq!(Command::sending_mode(1, true, 100).acknowledgement(), None);
    }

    #[test]
    fn valve_ordinals_follow_declaration_order() {
        for (index, state) in ValveState::ALL.iter().enumerate() {
            assert_eq!(usize::from(state.ordinal()), index);
            assert_eq!(ValveState::from_ordinal(state.ordinal()), Some(*state));
        }
        assert_eq!(ValveState::from_ordinal(7), None);
    }

    #[test]
    fn valve_state_accepts_common_spellings() {
        assert_eq!("slow-fill".parse::<ValveState>().unwrap(), ValveState::SlowFill);
        assert_eq!("MAX_EMPTY".parse::<ValveState>().unwrap(), ValveState::MaxEmpty);
        assert_eq!("CloseAll".parse::<ValveState>().unwrap(), ValveState::CloseAll);
        assert_eq!(" fast-fill ".parse::<ValveState>().unwrap(), ValveState::FastFill);
    }

    #[test]
    fn valve_state_rejects_unknown_name() {
        let err = "half-open".parse::<ValveState>().unwrap_err();
        assert!(matches!(err, InputError::InvalidValveState { .. }));
        assert!(err.to_string().contains("close-all"));
    }

    #[test]
    fn node_id_range_enforced() {
        assert_eq!(parse_node_id("1").unwrap(), 1);
        assert_eq!(parse_node_id(" 16 ").unwrap(), 16);
        assert!(matches!(
            parse_node_id("0"),
            Err(InputError::NodeOutOfRange { node_id: 0, .. })
        ));
        assert!(matches!(
            parse_node_id("17"),
            Err(InputError::NodeOutOfRange { node_id: 17, .. })
        ));
        assert!(matches!(
            parse_node_id("300"),
            Err(InputError::NodeOutOfRange { node_id: 300, .. })
        ));
        assert!(matches!(
            parse_node_id("two"),
            Err(InputError::InvalidNodeId { .. })
        ));
    }

    #[test]
    fn pressure_text_validated_before_encoding() {
        assert_eq!(parse_pressure("123.5").unwrap(), 123.5);
        assert_eq!(parse_pressure("-1").unwrap(), -1.0);

        let err = parse_pressure("12 bar").unwrap_err();
        assert_eq!(err.to_string(), "pressure \"12 bar\" is not a number");

        assert!(matches!(
            parse_pressure("NaN"),
            Err(InputError::NonFinitePressure { .. })
        ));
        assert!(matches!(
            parse_pressure("inf"),
            Err(InputError::NonFinitePressure { .. })
        ));
    }

    #[test]
    fn period_parsing() {
        assert_eq!(parse_period_ms("250").unwrap(), 250);
        assert!(matches!(
            parse_period_ms("70000"),
            Err(InputError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn sending_mode_zeroes_period_when_not_cyclic() {
        assert_eq!(
            Command::sending_mode(3, false, 500),
            Command::SetSendingMode {
                node_id: 3,
                cyclic: false,
                cycle_period_ms: 0
            }
        );
        assert_eq!(Command::sending_mode(3, true, 500).node_id(), 3);
    }
}
