use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pressurelink_frame::Revision;
use pressurelink_router::{poll_until, NodeBoard, RouterConfig, TelemetryRouter};
use tracing::info;

use crate::cmd::{open_device, parse_duration, MonitorArgs};
use crate::exit::{router_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_board, EventPrinter, OutputFormat};

pub fn run(args: MonitorArgs, revision: Revision, format: OutputFormat) -> CliResult<i32> {
    let config = RouterConfig {
        poll_interval: parse_duration(&args.interval)?,
        drain_all: !args.single_frame,
        ..RouterConfig::default()
    };
    let device = open_device(&args.serial)?;

    let mut router =
        TelemetryRouter::new(revision, (NodeBoard::new(), EventPrinter::new(format)))
            .with_config(config);
    router.install(device);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let summary = poll_until(&mut router, &running, |_, (_, printer)| {
        args.count.is_some_and(|count| printer.printed() >= count)
    })
    .map_err(|err| router_error("monitor failed", err))?;
    info!(
        ticks = summary.ticks,
        frames = summary.frames,
        decode_errors = summary.decode_errors,
        "monitor stopped"
    );

    if format != OutputFormat::Json {
        print_board(&router.sink().0, format);
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
