//! `tokio_util::codec` adapter for async hosts.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::split_frame;
use crate::command::Command;
use crate::error::{DecodeError, FrameError};
use crate::event::TelemetryEvent;
use crate::revision::{Revision, WireRevision};

/// Frames telemetry out of, and commands into, an async byte stream.
///
/// Each decoded item is the per-frame decode result: a malformed frame is
/// one `Err` item, and the stream carries on with the next frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryCodec {
    revision: Revision,
}

impl TelemetryCodec {
    pub fn new(revision: Revision) -> Self {
        Self { revision }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }
}

impl Decoder for TelemetryCodec {
    type Item = Result<TelemetryEvent, DecodeError>;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(split_frame(src).map(|frame| self.revision.decode(&frame)))
    }
}

impl Encoder<Command> for TelemetryCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = self.revision.encode(&item)?;
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
