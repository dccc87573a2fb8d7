use std::fs::File;
use std::path::Path;

use pressurelink_frame::{FrameError, FrameReader, Revision, WireRevision, FRAME_LEN};
use tracing::warn;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_decoded, DecodedRow, OutputFormat};

pub fn run(args: DecodeArgs, revision: Revision, format: OutputFormat) -> CliResult<i32> {
    let (rows, truncated) = match &args.file {
        Some(path) => decode_capture(path, revision)?,
        None => (decode_hex_args(&args.frames, revision)?, false),
    };

    print_decoded(&rows, format);

    if truncated || rows.iter().any(|row| row.error.is_some()) {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn decode_hex_args(inputs: &[String], revision: Revision) -> CliResult<Vec<DecodedRow>> {
    let mut rows = Vec::new();
    for input in inputs {
        let bytes = parse_hex(input)?;
        // An argument may hold several back-to-back frames.
        for chunk in bytes.chunks(FRAME_LEN) {
            rows.push(DecodedRow::new(rows.len(), chunk, revision.decode(chunk)));
        }
    }
    Ok(rows)
}

fn decode_capture(path: &Path, revision: Revision) -> CliResult<(Vec<DecodedRow>, bool)> {
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    let mut reader = FrameReader::new(file);
    let mut rows = Vec::new();

    loop {
        match reader.read_frame() {
            Ok(frame) => rows.push(DecodedRow::new(rows.len(), &frame, revision.decode(&frame))),
            Err(FrameError::ConnectionClosed { trailing }) => {
                if trailing > 0 {
                    warn!(trailing, "capture ends with a partial frame");
                }
                return Ok((rows, trailing > 0));
            }
            Err(err) => return Err(frame_error("capture read failed", err)),
        }
    }
}

/// Parse hex digits, ignoring whitespace, `:` and `-` separators and an
/// optional `0x` prefix.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != ':' && *c != '-')
        .collect();

    if digits.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("invalid hex frame {input:?}: no hex digits"),
        ));
    }
    hex::decode(&digits)
        .map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex frame {input:?}: {err}")))
}
