use pressurelink_frame::{Revision, WireRevision};

use crate::cmd::EncodeArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, revision: Revision, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.build()?;
    let frame = revision
        .encode(&command)
        .map_err(|err| CliError::new(USAGE, format!("encode failed: {err}")))?;

    print_encoded(&command, revision.name(), &frame, format);
    Ok(SUCCESS)
}
