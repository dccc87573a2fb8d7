//! Fixed-length frame codec for pneumatic pressure controllers.
//!
//! Every frame on the serial line is exactly 8 bytes: no length prefix, no
//! checksum, no delimiters. Byte 0 is the opcode; the remaining bytes carry
//! a node id and/or a little-endian IEEE-754 `f32`, or zero padding.
//!
//! Outbound [`Command`]s are encoded with the `encode_*` functions (or
//! [`encode_command`]); inbound frames decode into a [`TelemetryEvent`].
//! Opcode tables differ between controller firmware generations, so
//! [`Revision`] selects the table at connection time.

pub mod assembler;
pub mod codec;
pub mod command;
pub mod error;
pub mod event;
pub mod reader;
pub mod revision;

#[cfg(feature = "async")]
pub mod async_codec;

pub use assembler::FrameAssembler;
pub use codec::{
    decode, encode_command, encode_set_manual_mode, encode_set_sending_mode,
    encode_set_target_pressure, encode_set_valve, split_frame, RawFrame, FRAME_LEN,
};
pub use command::{
    parse_node_id, parse_period_ms, parse_pressure, Command, ValveState, MAX_NODE_ID,
    MIN_NODE_ID, NODE_COUNT,
};
pub use error::{DecodeError, EncodeError, FrameError, InputError, Result};
pub use event::{StatusKind, TelemetryEvent};
pub use reader::FrameReader;
pub use revision::{Current, Legacy, Revision, WireRevision};

#[cfg(feature = "async")]
pub use async_codec::TelemetryCodec;
