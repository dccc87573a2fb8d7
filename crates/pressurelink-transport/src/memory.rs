use std::collections::VecDeque;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-process transport backed by byte queues.
///
/// Inbound bytes are queued with [`push_inbound`](Self::push_inbound);
/// everything written is kept in [`written`](Self::written). A trickle limit
/// makes `bytes_available` report at most N bytes per poll, which is how a
/// slow UART hands over a frame in pieces.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    flushes: usize,
    trickle: Option<usize>,
    disconnected: bool,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with bytes already waiting to be read.
    pub fn with_inbound(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inbound: bytes.into().into(),
            ..Self::default()
        }
    }

    /// Limit how many bytes a single poll reports as available.
    pub fn set_trickle(&mut self, max_per_poll: Option<usize>) {
        self.trickle = max_per_poll;
    }

    /// Queue bytes as if the device had sent them.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Simulate the device being unplugged. Every later call fails.
    pub fn disconnect(&mut self) {
        debug!("memory transport disconnected");
        self.disconnected = true;
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Take and clear the bytes written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }

    /// Number of completed flushes.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Bytes still queued for reading.
    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.disconnected {
            return Err(TransportError::Disconnected);
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn bytes_available(&mut self) -> Result<usize> {
        self.ensure_connected()?;
        let queued = self.inbound.len();
        Ok(self.trickle.map_or(queued, |max| queued.min(max)))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_connected()?;
        if buf.len() > self.inbound.len() {
            return Err(TransportError::ShortRead {
                read: self.inbound.len(),
                wanted: buf.len(),
            });
        }
        let wanted = buf.len();
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..wanted)) {
            *slot = byte;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.outbound.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_connected()?;
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_queued_bytes_in_order() {
        let mut transport = MemoryTransport::with_inbound(vec![1, 2, 3, 4]);
        transport.push_inbound(&[5, 6]);
        assert_eq!(transport.bytes_available().unwrap(), 6);

        let mut head = [0u8; 4];
        transport.read_exact(&mut head).unwrap();
        assert_eq!(head, [1, 2, 3, 4]);
        assert_eq!(transport.pending_inbound(), 2);
    }

    #[test]
    fn trickle_caps_reported_bytes() {
        let mut transport = MemoryTransport::with_inbound(vec![0; 16]);
        transport.set_trickle(Some(3));
        assert_eq!(transport.bytes_available().unwrap(), 3);
        transport.set_trickle(None);
        assert_eq!(transport.bytes_available().unwrap(), 16);
    }

    #[test]
    fn short_read_is_reported() {
        let mut transport = MemoryTransport::with_inbound(vec![9; 3]);
        let mut buf = [0u8; 8];
        let err = transport.read_exact(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ShortRead { read: 3, wanted: 8 }
        ));
        assert_eq!(transport.pending_inbound(), 3);
    }

    #[test]
    fn disconnect_fails_every_operation() {
        let mut transport = MemoryTransport::with_inbound(vec![0; 8]);
        transport.disconnect();
        assert!(matches!(
            transport.bytes_available(),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(
            transport.write(&[1]),
            Err(TransportError::Disconnected)
        ));
        assert!(matches!(transport.flush(), Err(TransportError::Disconnected)));
    }

    #[test]
    fn take_written_clears_outbound() {
        let mut transport = MemoryTransport::new();
        transport.write(&[0xAA, 0xBB]).unwrap();
        assert_eq!(transport.take_written(), vec![0xAA, 0xBB]);
        assert!(transport.written().is_empty());
    }
}
