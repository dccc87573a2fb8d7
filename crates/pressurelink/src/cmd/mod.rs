use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use pressurelink_frame::{
    parse_node_id, parse_period_ms, parse_pressure, Command as WireCommand, Revision, ValveState,
};

#[cfg(unix)]
use crate::exit::transport_error;
use crate::exit::{input_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod monitor;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the wire frame for a command without sending it.
    Encode(EncodeArgs),
    /// Decode frames given as hex or read from a capture file.
    Decode(DecodeArgs),
    /// Send one command to a controller.
    Send(SendArgs),
    /// Print telemetry from a controller until interrupted.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, revision: Revision, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, revision, format),
        Command::Decode(args) => decode::run(args, revision, format),
        Command::Send(args) => send::run(args, revision, format),
        Command::Monitor(args) => monitor::run(args, revision, format),
        Command::Version(args) => version::run(args),
    }
}

/// A controller command as typed by an operator.
///
/// Arguments stay as text so they are validated with the same rules a
/// front panel would apply.
#[derive(Subcommand, Debug, Clone)]
pub enum FrameCommand {
    /// Set a node's target pressure.
    Target {
        /// Node id (1-16).
        node: String,
        /// Target pressure.
        #[arg(allow_hyphen_values = true)]
        pressure: String,
    },
    /// Enter or leave manual mode.
    Manual {
        /// Node id (1-16).
        node: String,
        action: ManualAction,
    },
    /// Drive a node's valves directly (requires manual mode).
    Valve {
        /// Node id (1-16).
        node: String,
        /// close-all, slow-empty, fast-empty, max-empty, slow-fill, fast-fill or max-fill.
        state: String,
    },
    /// Choose between on-request and cyclic telemetry.
    SendingMode {
        /// Node id (1-16).
        node: String,
        /// Report periodically instead of on request.
        #[arg(long)]
        cyclic: bool,
        /// Cycle period in milliseconds (ignored unless --cyclic).
        #[arg(long, default_value = "0")]
        period: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ManualAction {
    Enter,
    Exit,
}

impl FrameCommand {
    /// Validate operator input and build the wire command.
    pub fn build(&self) -> CliResult<WireCommand> {
        match self {
            FrameCommand::Target { node, pressure } => Ok(WireCommand::SetTargetPressure {
                node_id: node_id(node)?,
                pressure: parse_pressure(pressure)
                    .map_err(|err| input_error("invalid pressure", err))?,
            }),
            FrameCommand::Manual { node, action } => Ok(WireCommand::SetManualMode {
                node_id: node_id(node)?,
                enabled: *action == ManualAction::Enter,
            }),
            FrameCommand::Valve { node, state } => Ok(WireCommand::SetValve {
                node_id: node_id(node)?,
                valve_state: state
                    .parse::<ValveState>()
                    .map_err(|err| input_error("invalid valve state", err))?,
            }),
            FrameCommand::SendingMode {
                node,
                cyclic,
                period,
            } => {
                let period_ms =
                    parse_period_ms(period).map_err(|err| input_error("invalid period", err))?;
                Ok(WireCommand::sending_mode(node_id(node)?, *cyclic, period_ms))
            }
        }
    }
}

fn node_id(input: &str) -> CliResult<u8> {
    parse_node_id(input).map_err(|err| input_error("invalid node id", err))
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub command: FrameCommand,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frames as hex, one per argument (16 digits; spaces and colons allowed).
    #[arg(value_name = "HEX", conflicts_with = "file", required_unless_present = "file")]
    pub frames: Vec<String>,
    /// Read raw frames from a binary capture file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path (e.g. /dev/ttyUSB0).
    pub device: PathBuf,
    /// Line speed.
    #[arg(long, default_value = "115200")]
    pub baud: u32,
    /// Read timeout for the device (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub read_timeout: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Wait for an acknowledgement and print it (e.g. 2s, 500ms).
    #[arg(long, value_name = "DURATION")]
    pub wait: Option<String>,
    #[command(subcommand)]
    pub command: FrameCommand,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// Exit after printing N events.
    #[arg(long)]
    pub count: Option<usize>,
    /// Poll interval (e.g. 100ms).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Route at most one frame per poll.
    #[arg(long)]
    pub single_frame: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the serial device named on the command line.
#[cfg(unix)]
pub fn open_device(serial: &SerialArgs) -> CliResult<pressurelink_transport::TtyStream> {
    let config = pressurelink_transport::TtyConfig {
        baud_rate: serial.baud,
        read_timeout: parse_duration(&serial.read_timeout)?,
    };
    pressurelink_transport::TtyStream::open(&serial.device, config)
        .map_err(|err| transport_error("open failed", err))
}

#[cfg(not(unix))]
pub fn open_device(serial: &SerialArgs) -> CliResult<pressurelink_transport::MemoryTransport> {
    Err(CliError::new(
        crate::exit::TRANSPORT_ERROR,
        format!(
            "open failed: serial devices are only supported on Unix ({})",
            serial.device.display()
        ),
    ))
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
