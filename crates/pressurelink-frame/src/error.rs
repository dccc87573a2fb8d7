/// Errors produced when a frame cannot be turned into a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer than 8 bytes were presented. Wait for more bytes and retry.
    #[error("short frame ({len} bytes, need 8)")]
    ShortFrame { len: usize },

    /// Acknowledgement frame (opcode 0x07) with an unknown second-level code.
    #[error("unrecognized acknowledgement subcode 0x{subcode:02X}")]
    UnrecognizedSubframe { subcode: u8 },
}

/// Errors produced when a wire revision has no encoding for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The selected firmware revision does not understand this command.
    #[error("{command} is not supported by the {revision} wire revision")]
    Unsupported {
        revision: &'static str,
        command: &'static str,
    },
}

/// Rejections of operator input before anything is encoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The pressure text is not a number.
    #[error("pressure {input:?} is not a number")]
    InvalidPressure { input: String },

    /// The pressure parsed but is NaN or infinite.
    #[error("pressure {input:?} must be a finite number")]
    NonFinitePressure { input: String },

    /// The node id text is not an integer.
    #[error("node id {input:?} is not an integer")]
    InvalidNodeId { input: String },

    /// The node id is outside the addressable range.
    #[error("node id {node_id} is out of range ({min}..={max})")]
    NodeOutOfRange { node_id: u32, min: u8, max: u8 },

    /// The valve state name is not recognized.
    #[error("unknown valve state {input:?} (expected one of: {expected})")]
    InvalidValveState {
        input: String,
        expected: &'static str,
    },

    /// The cycle period is not an integer in 0..=65535 milliseconds.
    #[error("cycle period {input:?} must be 0..=65535 milliseconds")]
    InvalidPeriod { input: String },
}

/// Errors from stream-level frame handling (blocking reader, async codec).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended. Any trailing bytes did not form a whole frame.
    #[error("connection closed ({trailing} trailing bytes)")]
    ConnectionClosed { trailing: usize },

    /// A command could not be encoded for the selected revision.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
