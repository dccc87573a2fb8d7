use std::fmt;
use std::time::{Duration, SystemTime};

use pressurelink_frame::{
    Command, FrameAssembler, TelemetryEvent, WireRevision, MAX_NODE_ID, MIN_NODE_ID, NODE_COUNT,
};
use pressurelink_transport::{Transport, TransportError};
use tracing::{debug, info, trace, warn};

use crate::board::node_index;
use crate::error::{Result, RouterError};
use crate::sink::{PressureChannel, TelemetrySink};

/// Default time between ticks when driven by [`poll_until`](crate::poll_until).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default cap on bytes pulled from the transport in one tick.
pub const DEFAULT_MAX_READ_CHUNK: usize = 4096;

/// Router tuning.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Sleep between ticks in the poll loop.
    pub poll_interval: Duration,
    /// Route every complete frame each tick. When false, at most one frame
    /// is routed per tick and the rest stay buffered; no new bytes are read
    /// until the buffered frames are used up.
    pub drain_all: bool,
    /// Upper bound on bytes read per tick.
    pub max_read_chunk: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            drain_all: true,
            max_read_chunk: DEFAULT_MAX_READ_CHUNK,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Bytes pulled from the transport.
    pub bytes_read: usize,
    /// Complete frames taken from the buffer.
    pub frames: usize,
    /// Events delivered to the sink.
    pub routed: usize,
    /// Events with no consumer (atmosphere readings).
    pub discarded: usize,
    /// Node readings for ids outside 1..=16.
    pub dropped: usize,
    /// Frames that failed to decode.
    pub decode_errors: usize,
    /// Bytes left buffered after the tick.
    pub buffered: usize,
}

/// Where a decoded event went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Delivered as one or more pressure samples.
    Pressure,
    /// Delivered to the status consumer.
    Status,
    /// No consumer for this event.
    Discarded,
    /// Rejected (node id out of range).
    Dropped,
}

/// Poll-driven frame router between a transport and a [`TelemetrySink`].
///
/// The router never blocks: each [`tick`](Self::tick) reads only what the
/// transport reports as available. A transport failure tears the handle
/// down; every later call returns [`RouterError::NotConnected`] until a new
/// handle is [installed](Self::install).
pub struct TelemetryRouter<T, S> {
    transport: Option<T>,
    revision: Box<dyn WireRevision>,
    assembler: FrameAssembler,
    sink: S,
    config: RouterConfig,
    available: [bool; NODE_COUNT],
}

impl<T: Transport, S: TelemetrySink> TelemetryRouter<T, S> {
    /// Create a disconnected router.
    pub fn new(revision: impl WireRevision + 'static, sink: S) -> Self {
        Self {
            transport: None,
            revision: Box::new(revision),
            assembler: FrameAssembler::new(),
            sink,
            config: RouterConfig::default(),
            available: [false; NODE_COUNT],
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a transport handle, returning the previous one.
    ///
    /// Buffered bytes and node availability are reset.
    pub fn install(&mut self, transport: T) -> Option<T> {
        info!(revision = self.revision.name(), "transport installed");
        self.reset();
        self.transport.replace(transport)
    }

    /// Remove the transport handle and notify the sink.
    pub fn disconnect(&mut self) -> Option<T> {
        let transport = self.transport.take()?;
        self.reset();
        info!("transport disconnected by host");
        self.sink.on_disconnected("disconnected by host");
        Some(transport)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether a node has sent any output reading since install.
    pub fn is_available(&self, node_id: u8) -> bool {
        node_index(node_id).is_some_and(|index| self.available[index])
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn revision_name(&self) -> &'static str {
        self.revision.name()
    }

    /// Read available bytes and route complete frames, stamped now.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.tick_at(SystemTime::now())
    }

    /// Like [`tick`](Self::tick) with an explicit timestamp for the samples.
    pub fn tick_at(&mut self, now: SystemTime) -> Result<TickReport> {
        let backlog = !self.config.drain_all && self.assembler.complete_frames() > 0;
        let mut report = TickReport {
            bytes_read: if backlog {
                self.ensure_connected()?;
                0
            } else {
                self.pull()?
            },
            ..TickReport::default()
        };

        while let Some(frame) = self.assembler.next_frame() {
            report.frames += 1;
            match self.revision.decode(&frame) {
                Ok(event) => match self.route(event, now) {
                    RouteOutcome::Pressure | RouteOutcome::Status => report.routed += 1,
                    RouteOutcome::Discarded => report.discarded += 1,
                    RouteOutcome::Dropped => report.dropped += 1,
                },
                Err(err) => {
                    warn!(error = %err, frame = ?frame, "dropping undecodable frame");
                    report.decode_errors += 1;
                }
            }
            if !self.config.drain_all {
                break;
            }
        }

        report.buffered = self.assembler.buffered();
        if report.frames > 0 {
            trace!(
                frames = report.frames,
                routed = report.routed,
                buffered = report.buffered,
                "tick"
            );
        }
        Ok(report)
    }

    /// Deliver one decoded event to the sink.
    ///
    /// Also usable for replaying persisted telemetry without a transport.
    pub fn route(&mut self, event: TelemetryEvent, at: SystemTime) -> RouteOutcome {
        match event {
            TelemetryEvent::SupplyPressure(value) => {
                for node_id in MIN_NODE_ID..=MAX_NODE_ID {
                    self.sink
                        .on_node_pressure(node_id, PressureChannel::Supply, value, at);
                }
                RouteOutcome::Pressure
            }
            TelemetryEvent::NodePressure { node_id, pressure } => {
                let Some(index) = node_index(node_id) else {
                    warn!(node_id, "node pressure for unknown node dropped");
                    return RouteOutcome::Dropped;
                };
                if !self.available[index] {
                    self.available[index] = true;
                    debug!(node_id, "node available");
                    self.sink.on_node_available(node_id);
                }
                self.sink
                    .on_node_pressure(node_id, PressureChannel::Output, pressure, at);
                RouteOutcome::Pressure
            }
            TelemetryEvent::AtmospherePressure(value) => {
                trace!(value, "atmosphere pressure has no consumer");
                RouteOutcome::Discarded
            }
            other => match other.status() {
                Some((kind, code)) => {
                    if let TelemetryEvent::Unknown { opcode } = other {
                        debug!(opcode = format_args!("{opcode:#04x}"), "unknown opcode");
                    }
                    self.sink.on_status_event(kind, code);
                    RouteOutcome::Status
                }
                None => RouteOutcome::Discarded,
            },
        }
    }

    /// Encode and send a command as one write+flush.
    ///
    /// A successful set-target is echoed to the sink on the node's target
    /// channel.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(RouterError::NotConnected)?;
        let frame = self.revision.encode(command)?;
        if let Err(err) = transport.send(&frame) {
            return Err(self.teardown(err));
        }
        debug!(
            command = command.name(),
            node_id = command.node_id(),
            "command sent"
        );

        if let Command::SetTargetPressure { node_id, pressure } = *command {
            if node_index(node_id).is_some() {
                self.sink.on_node_pressure(
                    node_id,
                    PressureChannel::Target,
                    pressure,
                    SystemTime::now(),
                );
            }
        }
        Ok(())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.transport.is_some() {
            Ok(())
        } else {
            Err(RouterError::NotConnected)
        }
    }

    fn pull(&mut self) -> Result<usize> {
        let transport = self.transport.as_mut().ok_or(RouterError::NotConnected)?;
        match read_available(transport, self.config.max_read_chunk, &mut self.assembler) {
            Ok(read) => Ok(read),
            Err(err) => Err(self.teardown(err)),
        }
    }

    fn teardown(&mut self, err: TransportError) -> RouterError {
        let reason = err.to_string();
        warn!(error = %reason, "transport failed, tearing down");
        self.transport = None;
        self.reset();
        self.sink.on_disconnected(&reason);
        RouterError::TransportLost(err)
    }

    fn reset(&mut self) {
        self.assembler.clear();
        self.available = [false; NODE_COUNT];
    }
}

fn read_available<T: Transport>(
    transport: &mut T,
    max: usize,
    assembler: &mut FrameAssembler,
) -> pressurelink_transport::Result<usize> {
    let ready = transport.bytes_available()?.min(max);
    if ready == 0 {
        return Ok(0);
    }
    let mut chunk = vec![0u8; ready];
    transport.read_exact(&mut chunk)?;
    assembler.extend(&chunk);
    Ok(ready)
}

impl<T, S> fmt::Debug for TelemetryRouter<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryRouter")
            .field("revision", &self.revision.name())
            .field("connected", &self.transport.is_some())
            .field("buffered", &self.assembler.buffered())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pressurelink_frame::{Revision, StatusKind, ValveState};
    use pressurelink_transport::{MemoryTransport, SharedTransport};

    use super::*;
    use crate::board::NodeBoard;

    #[derive(Debug, Default)]
    struct Recorder {
        pressures: Vec<(u8, PressureChannel, f32)>,
        statuses: Vec<(StatusKind, u8)>,
        available: Vec<u8>,
        disconnects: Vec<String>,
    }

    impl TelemetrySink for Recorder {
        fn on_node_pressure(
            &mut self,
            node_id: u8,
            channel: PressureChannel,
            value: f32,
            _at: SystemTime,
        ) {
            self.pressures.push((node_id, channel, value));
        }

        fn on_status_event(&mut self, kind: StatusKind, code: u8) {
            self.statuses.push((kind, code));
        }

        fn on_node_available(&mut self, node_id: u8) {
            self.available.push(node_id);
        }

        fn on_disconnected(&mut self, reason: &str) {
            self.disconnects.push(reason.to_string());
        }
    }

    type Handle = SharedTransport<MemoryTransport>;

    fn connected(revision: Revision) -> (TelemetryRouter<Handle, Recorder>, Handle) {
        let handle = SharedTransport::new(MemoryTransport::new());
        let mut router = TelemetryRouter::new(revision, Recorder::default());
        router.install(handle.clone());
        (router, handle)
    }

    fn node_frame(node_id: u8, pressure: f32) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = 0x10;
        frame[1] = node_id;
        frame[2..6].copy_from_slice(&pressure.to_le_bytes());
        frame
    }

    fn supply_frame(pressure: f32) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[0] = 0x09;
        frame[1..5].copy_from_slice(&pressure.to_le_bytes());
        frame
    }

    #[test]
    fn drains_every_complete_frame_in_order() {
        let (mut router, handle) = connected(Revision::Current);
        for (node, value) in [(3, 42.0), (1, 10.5), (16, 99.0)] {
            handle.lock().push_inbound(&node_frame(node, value));
        }

        let report = router.tick().expect("tick should succeed");
        assert_eq!(report.frames, 3);
        assert_eq!(report.routed, 3);
        assert_eq!(report.bytes_read, 24);
        assert_eq!(
            router.sink().pressures,
            vec![
                (3, PressureChannel::Output, 42.0),
                (1, PressureChannel::Output, 10.5),
                (16, PressureChannel::Output, 99.0),
            ]
        );
    }

    #[test]
    fn supply_reaches_all_sixteen_nodes() {
        let (mut router, handle) = connected(Revision::Current);
        handle.lock().push_inbound(&supply_frame(6000.0));

        router.tick().expect("tick should succeed");
        let pressures = &router.sink().pressures;
        assert_eq!(pressures.len(), NODE_COUNT);
        for (expected_id, (node_id, channel, value)) in (1u8..).zip(pressures) {
            assert_eq!(*node_id, expected_id);
            assert_eq!(*channel, PressureChannel::Supply);
            assert_eq!(*value, 6000.0);
        }
        assert!(!router.is_available(1));
    }

    #[test]
    fn trickled_bytes_are_reassembled() {
        let (mut router, handle) = connected(Revision::Current);
        {
            let mut transport = handle.lock();
            transport.set_trickle(Some(3));
            transport.push_inbound(&node_frame(2, 7.0));
        }

        let first = router.tick().expect("tick should succeed");
        assert_eq!(first.frames, 0);
        assert_eq!(first.buffered, 3);

        let second = router.tick().expect("tick should succeed");
        assert_eq!(second.frames, 0);
        assert_eq!(second.buffered, 6);

        let third = router.tick().expect("tick should succeed");
        assert_eq!(third.frames, 1);
        assert_eq!(third.buffered, 0);
        assert_eq!(
            router.sink().pressures,
            vec![(2, PressureChannel::Output, 7.0)]
        );
    }

    #[test]
    fn node_marked_available_once() {
        let (mut router, handle) = connected(Revision::Current);
        handle.lock().push_inbound(&node_frame(5, 1.0));
        handle.lock().push_inbound(&node_frame(5, 2.0));

        router.tick().expect("tick should succeed");
        assert!(router.is_available(5));
        assert!(!router.is_available(6));
        assert_eq!(router.sink().available, vec![5]);
    }

    #[test]
    fn status_events_and_atmosphere() {
        let (mut router, handle) = connected(Revision::Current);
        {
            let mut transport = handle.lock();
            transport.push_inbound(&[0x07, 0, 0x09, 0, 0, 0, 0, 0]);
            transport.push_inbound(&[0x07, 0, 0x0F, 2, 0, 0, 0, 0]);
            transport.push_inbound(&[0xAB, 0, 0, 0, 0, 0, 0, 0]);
            transport.push_inbound(&[0x08, 0, 0, 0x80, 0x3F, 0, 0, 0]);
        }

        let report = router.tick().expect("tick should succeed");
        assert_eq!(report.routed, 3);
        assert_eq!(report.discarded, 1);
        assert!(router.sink().pressures.is_empty());
        assert_eq!(
            router.sink().statuses,
            vec![
                (StatusKind::ManualModeEnter, 0),
                (StatusKind::ValveFeedback, 2),
                (StatusKind::Unknown, 0xAB),
            ]
        );
    }

    #[test]
    fn decode_errors_are_counted_and_skipped() {
        let (mut router, handle) = connected(Revision::Current);
        {
            let mut transport = handle.lock();
            transport.push_inbound(&[0x07, 0, 0xFF, 0, 0, 0, 0, 0]);
            transport.push_inbound(&node_frame(1, 3.0));
        }

        let report = router.tick().expect("decode errors must not escape");
        assert_eq!(report.frames, 2);
        assert_eq!(report.decode_errors, 1);
        assert_eq!(report.routed, 1);
        assert!(router.is_connected());
    }

    #[test]
    fn out_of_range_node_dropped() {
        let (mut router, handle) = connected(Revision::Current);
        handle.lock().push_inbound(&node_frame(0, 1.0));
        handle.lock().push_inbound(&node_frame(17, 1.0));

        let report = router.tick().expect("tick should succeed");
        assert_eq!(report.dropped, 2);
        assert!(router.sink().pressures.is_empty());
        assert!(router.sink().available.is_empty());
    }

    #[test]
    fn single_frame_mode_leaves_rest_buffered() {
        let (router, handle) = connected(Revision::Current);
        let mut router = router.with_config(RouterConfig {
            drain_all: false,
            ..RouterConfig::default()
        });
        handle.lock().push_inbound(&node_frame(1, 1.0));
        handle.lock().push_inbound(&node_frame(2, 2.0));

        let first = router.tick().expect("tick should succeed");
        assert_eq!(first.frames, 1);
        assert_eq!(first.buffered, 8);

        let second = router.tick().expect("tick should succeed");
        assert_eq!(second.frames, 1);
        assert_eq!(second.buffered, 0);
        assert_eq!(router.sink().pressures.len(), 2);
    }

    #[test]
    fn single_frame_mode_stops_reading_while_backlogged() {
        let (router, handle) = connected(Revision::Current);
        let mut router = router.with_config(RouterConfig {
            drain_all: false,
            max_read_chunk: 64,
            ..RouterConfig::default()
        });
        for node in 1..=16u8 {
            handle.lock().push_inbound(&node_frame(node, 1.0));
        }

        for _ in 0..200 {
            handle.lock().push_inbound(&node_frame(1, 2.0));
            let report = router.tick().expect("tick should succeed");
            assert_eq!(report.frames, 1);
            assert!(report.buffered <= 64, "buffer grew to {}", report.buffered);
        }
        assert_eq!(router.sink().pressures.len(), 200);
    }

    #[test]
    fn read_chunk_caps_bytes_per_tick() {
        let (router, handle) = connected(Revision::Current);
        let mut router = router.with_config(RouterConfig {
            max_read_chunk: 8,
            ..RouterConfig::default()
        });
        handle.lock().push_inbound(&node_frame(1, 1.0));
        handle.lock().push_inbound(&node_frame(2, 2.0));

        assert_eq!(router.tick().expect("tick").bytes_read, 8);
        assert_eq!(handle.lock().pending_inbound(), 8);
        assert_eq!(router.tick().expect("tick").bytes_read, 8);
    }

    #[test]
    fn transport_failure_tears_down_until_reinstalled() {
        let (mut router, handle) = connected(Revision::Current);
        handle.lock().push_inbound(&node_frame(4, 1.0));
        router.tick().expect("tick should succeed");
        assert!(router.is_available(4));

        handle.lock().disconnect();
        let err = router.tick().expect_err("tick should fail");
        assert!(matches!(
            err,
            RouterError::TransportLost(TransportError::Disconnected)
        ));
        assert!(!router.is_connected());
        assert!(!router.is_available(4));
        assert_eq!(router.sink().disconnects.len(), 1);

        assert!(matches!(router.tick(), Err(RouterError::NotConnected)));
        let command = Command::SetManualMode {
            node_id: 4,
            enabled: true,
        };
        assert!(matches!(
            router.send(&command),
            Err(RouterError::NotConnected)
        ));

        let fresh = SharedTransport::new(MemoryTransport::with_inbound(node_frame(4, 2.0)));
        router.install(fresh);
        let report = router.tick().expect("tick after reinstall");
        assert_eq!(report.routed, 1);
        assert_eq!(router.sink().available, vec![4, 4]);
    }

    #[test]
    fn send_writes_and_flushes_one_frame() {
        let (mut router, handle) = connected(Revision::Current);
        router
            .send(&Command::SetValve {
                node_id: 2,
                valve_state: ValveState::FastFill,
            })
            .expect("send should succeed");

        let transport = handle.lock();
        assert_eq!(transport.written(), &[0x06, 2, 0x0F, 5, 0, 0, 0, 0]);
        assert_eq!(transport.flush_count(), 1);
    }

    #[test]
    fn set_target_is_echoed_on_target_channel() {
        let (mut router, handle) = connected(Revision::Current);
        router
            .send(&Command::SetTargetPressure {
                node_id: 9,
                pressure: 1500.0,
            })
            .expect("send should succeed");

        assert_eq!(handle.lock().written().len(), 8);
        assert_eq!(
            router.sink().pressures,
            vec![(9, PressureChannel::Target, 1500.0)]
        );
    }

    #[test]
    fn legacy_revision_refuses_unknown_commands() {
        let (mut router, handle) = connected(Revision::Legacy);
        let err = router
            .send(&Command::sending_mode(1, true, 250))
            .expect_err("legacy has no sending mode");
        assert!(matches!(err, RouterError::Encode(_)));
        assert!(router.is_connected());
        assert!(handle.lock().written().is_empty());

        router
            .send(&Command::SetTargetPressure {
                node_id: 1,
                pressure: 2.0,
            })
            .expect("legacy set-target should send");
        assert_eq!(handle.lock().written()[0], 0x11);
    }

    #[test]
    fn failed_send_tears_down() {
        let (mut router, handle) = connected(Revision::Current);
        handle.lock().disconnect();
        let err = router
            .send(&Command::SetManualMode {
                node_id: 1,
                enabled: false,
            })
            .expect_err("send should fail");
        assert!(matches!(err, RouterError::TransportLost(_)));
        assert!(!router.is_connected());
        assert_eq!(router.sink().disconnects.len(), 1);
    }

    #[test]
    fn host_disconnect_returns_handle() {
        let (mut router, _handle) = connected(Revision::Current);
        assert!(router.disconnect().is_some());
        assert!(router.disconnect().is_none());
        assert_eq!(
            router.sink().disconnects,
            vec!["disconnected by host".to_string()]
        );
    }

    #[test]
    fn route_without_transport_for_replay() {
        let mut router: TelemetryRouter<MemoryTransport, Recorder> =
            TelemetryRouter::new(Revision::Current, Recorder::default());
        let outcome = router.route(
            TelemetryEvent::NodePressure {
                node_id: 3,
                pressure: 12.0,
            },
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(outcome, RouteOutcome::Pressure);
        assert_eq!(
            router.route(TelemetryEvent::AtmospherePressure(1.0), SystemTime::UNIX_EPOCH),
            RouteOutcome::Discarded
        );
        assert!(router.is_available(3));
    }

    #[test]
    fn no_update_reading_leaves_board_node_unavailable() {
        let mut router: TelemetryRouter<MemoryTransport, NodeBoard> =
            TelemetryRouter::new(Revision::Current, NodeBoard::new());
        router.route(
            TelemetryEvent::NodePressure {
                node_id: 3,
                pressure: -1.0,
            },
            SystemTime::UNIX_EPOCH,
        );
        router.route(TelemetryEvent::SupplyPressure(6000.0), SystemTime::UNIX_EPOCH);

        assert!(router.is_available(3));
        let board = router.sink();
        assert_eq!(board.available_nodes().count(), 0);
        assert_eq!(board.output(3), None);
        assert_eq!(board.displayed_supply(3), None);

        router.route(
            TelemetryEvent::NodePressure {
                node_id: 3,
                pressure: 10.0,
            },
            SystemTime::UNIX_EPOCH,
        );
        assert_eq!(router.sink().displayed_supply(3), None);
        assert_eq!(router.sink().available_nodes().collect::<Vec<_>>(), vec![3]);
    }
}
