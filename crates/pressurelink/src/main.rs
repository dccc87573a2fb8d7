mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use pressurelink_frame::Revision;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "pressurelink",
    version,
    about = "Pneumatic pressure controller serial protocol CLI"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Controller firmware wire revision.
    #[arg(
        long,
        value_name = "REVISION",
        default_value = "current",
        env = "PRESSURELINK_REVISION",
        global = true
    )]
    revision: Revision,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, cli.revision, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::FrameCommand;

    #[test]
    fn parses_send_with_nested_command() {
        let cli = Cli::try_parse_from([
            "pressurelink",
            "send",
            "/dev/ttyUSB0",
            "target",
            "3",
            "1500",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert!(matches!(args.command, FrameCommand::Target { .. }));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn revision_flag_selects_legacy() {
        let cli = Cli::try_parse_from([
            "pressurelink",
            "--revision",
            "legacy",
            "decode",
            "0800000000000000",
        ])
        .expect("decode args should parse");
        assert_eq!(cli.revision, Revision::Legacy);
    }

    #[test]
    fn rejects_unknown_revision() {
        let err = Cli::try_parse_from(["pressurelink", "--revision", "v9", "version"])
            .expect_err("unknown revision should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn decode_hex_conflicts_with_file() {
        let err = Cli::try_parse_from([
            "pressurelink",
            "decode",
            "0800000000000000",
            "--file",
            "capture.bin",
        ])
        .expect_err("hex and --file should conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
