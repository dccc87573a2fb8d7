use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device node.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to apply line settings (raw mode, baud rate, timeouts).
    #[error("failed to configure {path}: {source}")]
    Configure {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested baud rate has no platform speed constant.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were readable than requested.
    #[error("short read ({read} of {wanted} bytes)")]
    ShortRead { read: usize, wanted: usize },

    /// The device went away (unplugged, hung up, or closed by the peer).
    #[error("transport disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
