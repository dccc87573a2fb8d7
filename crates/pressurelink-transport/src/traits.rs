use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// A byte transport to the embedded controller.
///
/// The protocol layer polls [`bytes_available`](Transport::bytes_available)
/// before every read, so implementations must never block there. Read
/// timeouts are a transport concern and surface as "zero bytes available",
/// not as errors.
pub trait Transport {
    /// Number of bytes readable right now without blocking.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Fill `buf` completely from the transport.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush buffered output to the device.
    fn flush(&mut self) -> Result<()>;

    /// Write then flush as one unit.
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.write(bytes)?;
        self.flush()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).send(bytes)
    }
}

/// A transport handle that can be cloned across threads.
///
/// Every operation takes the lock; [`send`](Transport::send) holds it across
/// the write and the flush so two senders never interleave partial frames.
pub struct SharedTransport<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedTransport<T> {
    /// Wrap a transport for shared use.
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Lock the transport for a multi-step operation.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recover the transport if this is the last handle.
    pub fn try_into_inner(self) -> std::result::Result<T, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<T> Clone for SharedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Transport for SharedTransport<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        self.lock().bytes_available()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.lock().read_exact(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.lock().write(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.lock().flush()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.lock();
        guard.write(bytes)?;
        guard.flush()
    }
}

impl<T> std::fmt::Debug for SharedTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTransport")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}
