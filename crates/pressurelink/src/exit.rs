use std::fmt;
use std::io;

use pressurelink_frame::{FrameError, InputError};
use pressurelink_router::RouterError;
use pressurelink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        TransportError::UnsupportedBaudRate(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        FrameError::Encode(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn router_error(context: &str, err: RouterError) -> CliError {
    match err {
        RouterError::Encode(_) => CliError::new(USAGE, format!("{context}: {err}")),
        RouterError::NotConnected | RouterError::TransportLost(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn input_error(context: &str, err: InputError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use pressurelink_frame::EncodeError;

    use super::*;

    #[test]
    fn transport_errors_map_to_exit_codes() {
        let missing = TransportError::Open {
            path: "/dev/ttyUSB9".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(transport_error("open", missing).code, FAILURE);

        let denied = TransportError::Open {
            path: "/dev/ttyUSB0".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open", denied).code, PERMISSION_DENIED);

        assert_eq!(
            transport_error("open", TransportError::UnsupportedBaudRate(7)).code,
            USAGE
        );
        assert_eq!(
            transport_error("read", TransportError::Disconnected).code,
            TRANSPORT_ERROR
        );
    }

    #[test]
    fn router_errors_map_to_exit_codes() {
        let unsupported = RouterError::Encode(EncodeError::Unsupported {
            revision: "legacy",
            command: "set-valve",
        });
        assert_eq!(router_error("send", unsupported).code, USAGE);

        let lost = RouterError::TransportLost(TransportError::Disconnected);
        let err = router_error("monitor", lost);
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.starts_with("monitor: transport lost"));
    }

    #[test]
    fn input_errors_are_usage_errors() {
        let err = input_error(
            "invalid node id",
            InputError::InvalidNodeId {
                input: "x".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
    }
}
