//! Poll-driven telemetry routing.
//!
//! A [`TelemetryRouter`] owns the transport handle. On every tick it reads
//! whatever bytes are available, reassembles whole 8-byte frames, decodes
//! them with the selected wire revision and routes each event to a
//! [`TelemetrySink`]: supply readings fan out to every node, node readings
//! go to that node only, acknowledgements go to the status consumer.

pub mod board;
pub mod error;
pub mod poller;
pub mod router;
pub mod sink;

pub use board::{node_index, NodeBoard, NodeReadings, Reading};
pub use error::{Result, RouterError};
pub use poller::{poll_until, PollSummary};
pub use router::{
    RouteOutcome, RouterConfig, TelemetryRouter, TickReport, DEFAULT_MAX_READ_CHUNK,
    DEFAULT_POLL_INTERVAL,
};
pub use sink::{PressureChannel, TelemetrySink};
