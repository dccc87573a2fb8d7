use bytes::BytesMut;

use crate::codec::{split_frame, RawFrame, FRAME_LEN};

const INITIAL_BUFFER_CAPACITY: usize = 64 * FRAME_LEN;

/// Accumulates transport bytes and hands out whole 8-byte frames.
///
/// Transports may deliver a frame in several pieces; nothing is decoded
/// until all 8 bytes of it are buffered.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append bytes read from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Remove and return the oldest complete frame.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        split_frame(&mut self.buf)
    }

    /// Number of whole frames ready to be taken.
    pub fn complete_frames(&self) -> usize {
        self.buf.len() / FRAME_LEN
    }

    /// Bytes buffered, including any partial trailing frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything buffered (used when a transport is torn down).
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
