use std::io::{ErrorKind, Read};

use crate::assembler::FrameAssembler;
use crate::codec::RawFrame;
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete frames from any `Read` stream (capture files, pipes).
///
/// Handles partial reads internally; callers always get whole frames.
pub struct FrameReader<T> {
    inner: T,
    assembler: FrameAssembler,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            assembler: FrameAssembler::new(),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` at EOF, reporting how many
    /// bytes of an incomplete final frame were left over.
    pub fn read_frame(&mut self) -> Result<RawFrame> {
        loop {
            if let Some(frame) = self.assembler.next_frame() {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed {
                    trailing: self.assembler.buffered(),
                });
            }

            self.assembler.extend(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
