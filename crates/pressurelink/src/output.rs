use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pressurelink_frame::{Command, DecodeError, StatusKind, TelemetryEvent, MIN_NODE_ID};
use pressurelink_router::{NodeBoard, PressureChannel, TelemetrySink};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// Tables for batch output; streamed events print as lines.
    Table,
    /// Human-readable lines.
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

#[derive(Serialize)]
struct EncodedOutput<'a> {
    command: &'a str,
    node_id: u8,
    revision: &'a str,
    frame: String,
}

pub fn print_encoded(command: &Command, revision: &str, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&EncodedOutput {
            command: command.name(),
            node_id: command.node_id(),
            revision,
            frame: hex::encode(frame),
        }),
        OutputFormat::Table => {
            let mut table = new_table();
            table
                .set_header(vec!["COMMAND", "NODE", "REVISION", "FRAME"])
                .add_row(vec![
                    command.name().to_string(),
                    command.node_id().to_string(),
                    revision.to_string(),
                    spaced_hex(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(frame)),
    }
}

/// One decoded (or undecodable) frame for the `decode` command.
#[derive(Debug, Serialize)]
pub struct DecodedRow {
    pub index: usize,
    pub frame: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DecodedRow {
    pub fn new(index: usize, frame: &[u8], result: Result<TelemetryEvent, DecodeError>) -> Self {
        let mut row = Self {
            index,
            frame: hex::encode(frame),
            event: None,
            node_id: None,
            pressure: None,
            status: None,
            opcode: None,
            error: None,
        };
        match result {
            Ok(event) => {
                row.event = Some(event.name());
                match event {
                    TelemetryEvent::AtmospherePressure(value)
                    | TelemetryEvent::SupplyPressure(value) => row.pressure = Some(value),
                    TelemetryEvent::NodePressure { node_id, pressure } => {
                        row.node_id = Some(node_id);
                        row.pressure = Some(pressure);
                    }
                    TelemetryEvent::ManualModeEnter(code)
                    | TelemetryEvent::ManualModeExit(code)
                    | TelemetryEvent::ValveFeedback(code) => row.status = Some(code),
                    TelemetryEvent::Unknown { opcode } => {
                        row.opcode = Some(format!("{opcode:#04x}"));
                    }
                }
            }
            Err(err) => row.error = Some(err.to_string()),
        }
        row
    }

    fn detail(&self) -> String {
        if let Some(error) = &self.error {
            return format!("error: {error}");
        }
        let mut parts = Vec::new();
        if let Some(node_id) = self.node_id {
            parts.push(format!("node={node_id}"));
        }
        if let Some(pressure) = self.pressure {
            parts.push(format!("pressure={pressure}"));
        }
        if let Some(status) = self.status {
            parts.push(format!("status={status}"));
        }
        if let Some(opcode) = &self.opcode {
            parts.push(format!("opcode={opcode}"));
        }
        parts.join(" ")
    }
}

pub fn print_decoded(rows: &[DecodedRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for row in rows {
                print_json(row);
            }
        }
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["#", "FRAME", "EVENT", "DETAIL"]);
            for row in rows {
                table.add_row(vec![
                    row.index.to_string(),
                    row.frame.clone(),
                    row.event.unwrap_or("-").to_string(),
                    row.detail(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "#{} {} {} {}",
                    row.index,
                    row.frame,
                    row.event.unwrap_or("invalid"),
                    row.detail()
                );
            }
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum StreamOutput<'a> {
    Pressure {
        #[serde(skip_serializing_if = "Option::is_none")]
        node_id: Option<u8>,
        channel: &'a str,
        value: f32,
        timestamp: String,
    },
    Status {
        kind: &'a str,
        code: u8,
        timestamp: String,
    },
}

/// Sink that prints routed telemetry as it arrives.
#[derive(Debug)]
pub struct EventPrinter {
    format: OutputFormat,
    printed: usize,
    statuses: usize,
    seen: Vec<StatusKind>,
}

impl EventPrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            printed: 0,
            statuses: 0,
            seen: Vec::new(),
        }
    }

    /// Events printed so far.
    pub fn printed(&self) -> usize {
        self.printed
    }

    /// Status events (acknowledgements, unknown frames) seen so far.
    pub fn statuses(&self) -> usize {
        self.statuses
    }

    pub fn has_seen(&self, kind: StatusKind) -> bool {
        self.seen.contains(&kind)
    }
}

impl TelemetrySink for EventPrinter {
    fn on_node_pressure(
        &mut self,
        node_id: u8,
        channel: PressureChannel,
        value: f32,
        at: SystemTime,
    ) {
        // Supply arrives once per node; print the first copy only.
        let node_id = match channel {
            PressureChannel::Supply if node_id != MIN_NODE_ID => return,
            PressureChannel::Supply => None,
            _ => Some(node_id),
        };
        self.printed += 1;

        match self.format {
            OutputFormat::Json => print_json(&StreamOutput::Pressure {
                node_id,
                channel: channel.as_str(),
                value,
                timestamp: unix_seconds(at),
            }),
            OutputFormat::Table | OutputFormat::Pretty => match node_id {
                Some(node_id) => println!("node={node_id} {channel}={value}"),
                None => println!("all {channel}={value}"),
            },
        }
    }

    fn on_status_event(&mut self, kind: StatusKind, code: u8) {
        self.printed += 1;
        self.statuses += 1;
        if !self.seen.contains(&kind) {
            self.seen.push(kind);
        }

        match self.format {
            OutputFormat::Json => print_json(&StreamOutput::Status {
                kind: kind.as_str(),
                code,
                timestamp: unix_seconds(SystemTime::now()),
            }),
            OutputFormat::Table | OutputFormat::Pretty => match kind {
                StatusKind::Unknown => println!("status {kind} opcode={code:#04x}"),
                _ => println!("status {kind} code={code}"),
            },
        }
    }

    fn on_node_available(&mut self, node_id: u8) {
        tracing::info!(node_id, "node available");
    }

    fn on_disconnected(&mut self, reason: &str) {
        tracing::warn!(reason, "controller disconnected");
    }
}

#[derive(Serialize)]
struct NodeOutput {
    node_id: u8,
    output: Option<f32>,
    supply: Option<f32>,
    target: Option<f32>,
}

#[derive(Serialize)]
struct BoardOutput {
    nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_status: Option<String>,
}

/// Latest values of every available node.
pub fn print_board(board: &NodeBoard, format: OutputFormat) {
    let nodes: Vec<NodeOutput> = board
        .available_nodes()
        .map(|node_id| NodeOutput {
            node_id,
            output: board.output(node_id),
            supply: board.displayed_supply(node_id),
            target: board.displayed_target(node_id),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&BoardOutput {
            nodes,
            last_status: board
                .last_status()
                .map(|(kind, code)| format!("{kind}:{code}")),
        }),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["NODE", "OUTPUT", "SUPPLY", "TARGET"]);
            for node in &nodes {
                table.add_row(vec![
                    node.node_id.to_string(),
                    cell(node.output),
                    cell(node.supply),
                    cell(node.target),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for node in &nodes {
                println!(
                    "node={} output={} supply={} target={}",
                    node.node_id,
                    cell(node.output),
                    cell(node.supply),
                    cell(node.target)
                );
            }
        }
    }
}

fn cell(value: Option<f32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn unix_seconds(at: SystemTime) -> String {
    at.duration_since(UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0".to_string())
}
