use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use pressurelink_transport::Transport;
use tracing::debug;

use crate::error::Result;
use crate::router::{TelemetryRouter, TickReport};
use crate::sink::TelemetrySink;

/// Totals across a [`poll_until`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub ticks: u64,
    pub frames: usize,
    pub decode_errors: usize,
}

/// Tick the router every `poll_interval` until `running` is cleared or
/// `stop` returns true.
///
/// `stop` sees each tick's report and the sink. Transport failures end the
/// loop with the error; the router is already torn down by then.
pub fn poll_until<T, S, F>(
    router: &mut TelemetryRouter<T, S>,
    running: &AtomicBool,
    mut stop: F,
) -> Result<PollSummary>
where
    T: Transport,
    S: TelemetrySink,
    F: FnMut(&TickReport, &S) -> bool,
{
    let interval = router.config().poll_interval;
    let mut summary = PollSummary::default();

    while running.load(Ordering::SeqCst) {
        let report = router.tick()?;
        summary.ticks += 1;
        summary.frames += report.frames;
        summary.decode_errors += report.decode_errors;

        if stop(&report, router.sink()) {
            break;
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    debug!(
        ticks = summary.ticks,
        frames = summary.frames,
        decode_errors = summary.decode_errors,
        "poll loop finished"
    );
    Ok(summary)
}
