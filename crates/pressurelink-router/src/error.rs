use pressurelink_frame::EncodeError;
use pressurelink_transport::TransportError;

/// Errors that can occur while routing telemetry or sending commands.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// No transport is installed (never connected, or torn down).
    #[error("not connected")]
    NotConnected,

    /// The transport failed and has been torn down. Reconnect explicitly.
    #[error("transport lost: {0}")]
    TransportLost(#[source] TransportError),

    /// The command has no encoding in the selected wire revision.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, RouterError>;
