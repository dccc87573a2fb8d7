//! Serial wire protocol for multi-node pneumatic pressure controllers.
//!
//! A host talks to up to 16 pressure-control nodes over one serial line
//! using fixed 8-byte frames. This crate bundles the layers:
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transports (serial device, in-memory, shared handle)
//! - [`frame`]: the 8-byte frame codec and wire revisions
//! - [`router`]: poll-driven decoding and routing of telemetry to sinks

/// Re-export transport types.
pub mod transport {
    pub use pressurelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pressurelink_frame::*;
}

/// Re-export router types.
pub mod router {
    pub use pressurelink_router::*;
}
