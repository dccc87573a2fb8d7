use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use pressurelink_frame::Revision;
use pressurelink_router::{poll_until, RouterConfig, TelemetryRouter};
use tracing::info;

use crate::cmd::{open_device, parse_duration, SendArgs};
use crate::exit::{router_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{EventPrinter, OutputFormat};

const ACK_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(args: SendArgs, revision: Revision, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.build()?;
    let wait = args.wait.as_deref().map(parse_duration).transpose()?;
    let expected = command.acknowledgement();
    if wait.is_some() && expected.is_none() {
        return Err(CliError::new(
            USAGE,
            format!("{} is not acknowledged; drop --wait", command.name()),
        ));
    }
    let device = open_device(&args.serial)?;

    let mut router = TelemetryRouter::new(revision, EventPrinter::new(format)).with_config(
        RouterConfig {
            poll_interval: ACK_POLL_INTERVAL,
            ..RouterConfig::default()
        },
    );
    router.install(device);
    router
        .send(&command)
        .map_err(|err| router_error("send failed", err))?;
    info!(
        command = command.name(),
        node_id = command.node_id(),
        revision = %revision,
        "command sent"
    );

    let (Some(wait), Some(expected)) = (wait, expected) else {
        return Ok(SUCCESS);
    };

    let deadline = Instant::now() + wait;
    let running = AtomicBool::new(true);
    poll_until(&mut router, &running, |_, printer| {
        printer.has_seen(expected) || Instant::now() >= deadline
    })
    .map_err(|err| router_error("receive failed", err))?;

    if !router.sink().has_seen(expected) {
        return Err(CliError::new(
            TIMEOUT,
            format!("no {expected} acknowledgement within {wait:?}"),
        ));
    }
    Ok(SUCCESS)
}
