use std::fmt;
use std::time::SystemTime;

use pressurelink_frame::StatusKind;

/// The three per-node pressure series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PressureChannel {
    /// Supply line pressure (broadcast to every node).
    Supply,
    /// Measured output pressure of the node.
    Output,
    /// Commanded target pressure of the node.
    Target,
}

impl PressureChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            PressureChannel::Supply => "supply",
            PressureChannel::Output => "output",
            PressureChannel::Target => "target",
        }
    }
}

impl fmt::Display for PressureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumer of routed telemetry (charts, loggers, the CLI printer).
///
/// Callbacks run on the thread driving the router and must not block.
pub trait TelemetrySink {
    /// A pressure sample for one node's channel.
    fn on_node_pressure(
        &mut self,
        node_id: u8,
        channel: PressureChannel,
        value: f32,
        at: SystemTime,
    );

    /// An acknowledgement or unrecognized frame.
    fn on_status_event(&mut self, kind: StatusKind, code: u8);

    /// First output reading from a node since the transport was installed.
    ///
    /// Sent for any reading, including the negative "no update" value.
    fn on_node_available(&mut self, _node_id: u8) {}

    /// The transport was torn down.
    fn on_disconnected(&mut self, _reason: &str) {}
}

impl<S: TelemetrySink + ?Sized> TelemetrySink for &mut S {
    fn on_node_pressure(
        &mut self,
        node_id: u8,
        channel: PressureChannel,
        value: f32,
        at: SystemTime,
    ) {
        (**self).on_node_pressure(node_id, channel, value, at);
    }

    fn on_status_event(&mut self, kind: StatusKind, code: u8) {
        (**self).on_status_event(kind, code);
    }

    fn on_node_available(&mut self, node_id: u8) {
        (**self).on_node_available(node_id);
    }

    fn on_disconnected(&mut self, reason: &str) {
        (**self).on_disconnected(reason);
    }
}

/// Fan out to two sinks, first `A` then `B`.
impl<A: TelemetrySink, B: TelemetrySink> TelemetrySink for (A, B) {
    fn on_node_pressure(
        &mut self,
        node_id: u8,
        channel: PressureChannel,
        value: f32,
        at: SystemTime,
    ) {
        self.0.on_node_pressure(node_id, channel, value, at);
        self.1.on_node_pressure(node_id, channel, value, at);
    }

    fn on_status_event(&mut self, kind: StatusKind, code: u8) {
        self.0.on_status_event(kind, code);
        self.1.on_status_event(kind, code);
    }

    fn on_node_available(&mut self, node_id: u8) {
        self.0.on_node_available(node_id);
        self.1.on_node_available(node_id);
    }

    fn on_disconnected(&mut self, reason: &str) {
        self.0.on_disconnected(reason);
        self.1.on_disconnected(reason);
    }
}
