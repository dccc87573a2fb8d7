use std::time::SystemTime;

use pressurelink_frame::{StatusKind, MAX_NODE_ID, MIN_NODE_ID, NODE_COUNT};
use tracing::trace;

use crate::sink::{PressureChannel, TelemetrySink};

/// Array slot for a node id, or `None` outside `1..=16`.
pub fn node_index(node_id: u8) -> Option<usize> {
    if (MIN_NODE_ID..=MAX_NODE_ID).contains(&node_id) {
        Some(usize::from(node_id - MIN_NODE_ID))
    } else {
        None
    }
}

/// A timestamped sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f32,
    pub at: SystemTime,
}

/// Latest values for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeReadings {
    pub supply: Option<Reading>,
    pub output: Option<Reading>,
    pub target: Option<Reading>,
    /// Set by the first non-negative output pressure.
    pub available: bool,
}

/// Latest-value view of all 16 nodes, kept in a fixed array.
///
/// Negative values are treated as "no update" and ignored. Note this also
/// swallows any legitimately negative (vacuum) reading. Supply and target
/// samples are only kept once the node has reported a usable output
/// pressure; earlier ones are dropped.
#[derive(Debug, Clone, Default)]
pub struct NodeBoard {
    nodes: [NodeReadings; NODE_COUNT],
    last_status: Option<(StatusKind, u8)>,
    disconnect_reason: Option<String>,
}

impl NodeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, node_id: u8) -> Option<&NodeReadings> {
        node_index(node_id).map(|index| &self.nodes[index])
    }

    /// Latest output pressure.
    pub fn output(&self, node_id: u8) -> Option<f32> {
        self.node(node_id)?.output.map(|r| r.value)
    }

    /// Supply pressure, shown only once the node is available.
    pub fn displayed_supply(&self, node_id: u8) -> Option<f32> {
        let node = self.node(node_id).filter(|node| node.available)?;
        node.supply.map(|r| r.value)
    }

    /// Target pressure, shown only once the node is available.
    pub fn displayed_target(&self, node_id: u8) -> Option<f32> {
        let node = self.node(node_id).filter(|node| node.available)?;
        node.target.map(|r| r.value)
    }

    /// Ids of nodes that have reported an output pressure.
    pub fn available_nodes(&self) -> impl Iterator<Item = u8> + '_ {
        (MIN_NODE_ID..=MAX_NODE_ID).filter(|id| self.node(*id).is_some_and(|node| node.available))
    }

    pub fn last_status(&self) -> Option<(StatusKind, u8)> {
        self.last_status
    }

    /// Why the transport was last torn down, if it was.
    pub fn disconnect_reason(&self) -> Option<&str> {
        self.disconnect_reason.as_deref()
    }
}

impl TelemetrySink for NodeBoard {
    fn on_node_pressure(
        &mut self,
        node_id: u8,
        channel: PressureChannel,
        value: f32,
        at: SystemTime,
    ) {
        if value < 0.0 {
            trace!(node_id, %channel, value, "negative pressure means no update");
            return;
        }
        let Some(index) = node_index(node_id) else {
            return;
        };
        let node = &mut self.nodes[index];
        let reading = Some(Reading { value, at });
        match channel {
            PressureChannel::Output => {
                node.output = reading;
                node.available = true;
            }
            _ if !node.available => {
                trace!(node_id, %channel, "node not yet available, sample dropped");
            }
            PressureChannel::Supply => node.supply = reading,
            PressureChannel::Target => node.target = reading,
        }
    }

    fn on_status_event(&mut self, kind: StatusKind, code: u8) {
        self.last_status = Some((kind, code));
    }

    fn on_disconnected(&mut self, reason: &str) {
        for node in &mut self.nodes {
            node.available = false;
            node.supply = None;
            node.target = None;
        }
        self.disconnect_reason = Some(reason.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    #[test]
    fn node_index_maps_one_based_ids() {
        assert_eq!(node_index(1), Some(0));
        assert_eq!(node_index(16), Some(15));
        assert_eq!(node_index(0), None);
        assert_eq!(node_index(17), None);
    }

    #[test]
    fn samples_before_availability_are_dropped() {
        let mut board = NodeBoard::new();
        board.on_node_pressure(4, PressureChannel::Supply, 6000.0, now());
        board.on_node_pressure(4, PressureChannel::Target, 1500.0, now());
        board.on_node_pressure(4, PressureChannel::Output, 1490.0, now());
        assert_eq!(board.displayed_supply(4), None);
        assert_eq!(board.displayed_target(4), None);
        assert_eq!(board.output(4), Some(1490.0));
        assert_eq!(board.available_nodes().collect::<Vec<_>>(), vec![4]);

        board.on_node_pressure(4, PressureChannel::Supply, 6100.0, now());
        board.on_node_pressure(4, PressureChannel::Target, 1600.0, now());
        assert_eq!(board.displayed_supply(4), Some(6100.0));
        assert_eq!(board.displayed_target(4), Some(1600.0));
    }

    #[test]
    fn no_update_output_does_not_make_node_available() {
        let mut board = NodeBoard::new();
        board.on_node_available(3);
        board.on_node_pressure(3, PressureChannel::Output, -1.0, now());
        assert_eq!(board.available_nodes().count(), 0);
        assert_eq!(board.output(3), None);

        board.on_node_pressure(3, PressureChannel::Supply, 6000.0, now());
        assert_eq!(board.displayed_supply(3), None);

        board.on_node_pressure(3, PressureChannel::Output, 0.0, now());
        assert_eq!(board.available_nodes().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn negative_values_do_not_update() {
        let mut board = NodeBoard::new();
        board.on_node_pressure(2, PressureChannel::Output, 100.0, now());
        board.on_node_pressure(2, PressureChannel::Output, -1.0, now());
        assert_eq!(board.output(2), Some(100.0));
    }

    #[test]
    fn out_of_range_nodes_ignored() {
        let mut board = NodeBoard::new();
        board.on_node_pressure(0, PressureChannel::Output, 1.0, now());
        board.on_node_pressure(99, PressureChannel::Output, 1.0, now());
        board.on_node_available(99);
        assert!(board.node(0).is_none());
        assert_eq!(board.available_nodes().count(), 0);
    }

    #[test]
    fn disconnect_clears_availability() {
        let mut board = NodeBoard::new();
        board.on_node_pressure(1, PressureChannel::Output, 5.0, now());
        board.on_status_event(StatusKind::ValveFeedback, 0);
        board.on_disconnected("unplugged");

        assert_eq!(board.available_nodes().count(), 0);
        assert_eq!(board.disconnect_reason(), Some("unplugged"));
        assert_eq!(board.last_status(), Some((StatusKind::ValveFeedback, 0)));
    }
}
