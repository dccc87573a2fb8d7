//! Byte transport abstraction for the pressurelink serial protocol.
//!
//! The protocol layer never talks to a device directly. It polls a
//! [`Transport`] for available bytes, reads what is there, and writes
//! encoded command frames back. Implementations provided here:
//! - [`MemoryTransport`]: in-process byte queues (tests, dry runs)
//! - [`SharedTransport`]: mutex-guarded handle for multi-threaded hosts
//! - [`TtyStream`]: a serial device node on Unix

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::{SharedTransport, Transport};

#[cfg(unix)]
pub use tty::{TtyConfig, TtyStream};
