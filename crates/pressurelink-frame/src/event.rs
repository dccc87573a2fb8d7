use std::fmt;

/// One decoded inbound frame.
///
/// Pressure values are raw `f32` readings; the codec makes no claim about
/// unit or sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryEvent {
    /// Ambient pressure reported by the controller.
    AtmospherePressure(f32),
    /// Supply line pressure, shared by every node.
    SupplyPressure(f32),
    /// Output pressure of a single node.
    NodePressure { node_id: u8, pressure: f32 },
    /// Acknowledgement of a manual-mode enter request. 0 = success.
    ManualModeEnter(u8),
    /// Acknowledgement of a manual-mode exit request. 0 = success.
    ManualModeExit(u8),
    /// Acknowledgement of a valve command. 0 = success.
    ValveFeedback(u8),
    /// Opcode not recognized by the selected revision.
    Unknown { opcode: u8 },
}

impl TelemetryEvent {
    /// Status-style events (acknowledgements and unknown frames) as a
    /// `(kind, code)` pair; `None` for pressure readings.
    pub fn status(&self) -> Option<(StatusKind, u8)> {
        match *self {
            TelemetryEvent::ManualModeEnter(code) => Some((StatusKind::ManualModeEnter, code)),
            TelemetryEvent::ManualModeExit(code) => Some((StatusKind::ManualModeExit, code)),
            TelemetryEvent::ValveFeedback(code) => Some((StatusKind::ValveFeedback, code)),
            TelemetryEvent::Unknown { opcode } => Some((StatusKind::Unknown, opcode)),
            _ => None,
        }
    }

    /// Short name for logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::AtmospherePressure(_) => "atmosphere-pressure",
            TelemetryEvent::SupplyPressure(_) => "supply-pressure",
            TelemetryEvent::NodePressure { .. } => "node-pressure",
            TelemetryEvent::ManualModeEnter(_) => "manual-mode-enter",
            TelemetryEvent::ManualModeExit(_) => "manual-mode-exit",
            TelemetryEvent::ValveFeedback(_) => "valve-feedback",
            TelemetryEvent::Unknown { .. } => "unknown",
        }
    }
}

/// Non-pressure events forwarded to the status consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    ManualModeEnter,
    ManualModeExit,
    ValveFeedback,
    /// The code is the unrecognized opcode.
    Unknown,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::ManualModeEnter => "manual-mode-enter",
            StatusKind::ManualModeExit => "manual-mode-exit",
            StatusKind::ValveFeedback => "valve-feedback",
            StatusKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgements_map_to_status() {
        assert_eq!(
            TelemetryEvent::ValveFeedback(2).status(),
            Some((StatusKind::ValveFeedback, 2))
        );
        assert_eq!(
            TelemetryEvent::Unknown { opcode: 0xAB }.status(),
            Some((StatusKind::Unknown, 0xAB))
        );
        assert_eq!(TelemetryEvent::SupplyPressure(1.0).status(), None);
    }
}
