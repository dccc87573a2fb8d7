//! Replay a binary capture through the router and print the latest value of
//! every node that reported.
//!
//! Usage: `cargo run --example capture-summary -- capture.bin [legacy|current]`

use std::fs::File;
use std::time::SystemTime;

use pressurelink::frame::{FrameError, FrameReader, Revision, WireRevision};
use pressurelink::router::{NodeBoard, TelemetryRouter};
use pressurelink::transport::MemoryTransport;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: capture-summary <capture> [revision]")?;
    let revision: Revision = match args.next() {
        Some(name) => name.parse()?,
        None => Revision::default(),
    };

    let mut reader = FrameReader::new(File::open(&path)?);
    let mut router: TelemetryRouter<MemoryTransport, NodeBoard> =
        TelemetryRouter::new(revision, NodeBoard::new());
    let mut frames = 0usize;
    let mut rejected = 0usize;

    loop {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed { trailing }) => {
                if trailing > 0 {
                    eprintln!("ignoring {trailing} trailing bytes");
                }
                break;
            }
            Err(err) => return Err(err.into()),
        };
        frames += 1;
        match revision.decode(&frame) {
            Ok(event) => {
                router.route(event, SystemTime::now());
            }
            Err(err) => {
                rejected += 1;
                eprintln!("frame {frames}: {err}");
            }
        }
    }

    let board = router.sink();
    println!("{frames} frames, {rejected} rejected ({revision} revision)");
    for node_id in board.available_nodes() {
        let show = |value: Option<f32>| value.map_or("-".to_string(), |v| v.to_string());
        println!(
            "node {node_id:>2}: output={} supply={} target={}",
            show(board.output(node_id)),
            show(board.displayed_supply(node_id)),
            show(board.displayed_target(node_id)),
        );
    }
    if let Some((kind, code)) = board.last_status() {
        println!("last status: {kind} ({code})");
    }
    Ok(())
}
