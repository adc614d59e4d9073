use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use avionlink_control::{LoopStats, Register};
use avionlink_frame::{input_channel_name, Frame, REGISTER_SLOTS};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
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

#[derive(Serialize)]
struct FrameOutput<'a> {
    port: &'a str,
    index: u8,
    channel: &'a str,
    value: i32,
    encoded: i64,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, port: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                port,
                index: frame.index,
                channel: input_channel_name(frame.index),
                value: frame.value,
                encoded: frame.encoded(),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["INDEX", "CHANNEL", "VALUE", "PORT"]);
            table.add_row(vec![
                frame.index.to_string(),
                input_channel_name(frame.index).to_string(),
                frame.value.to_string(),
                port.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "index={} ({}) value={} port={}",
                frame.index,
                input_channel_name(frame.index),
                frame.value,
                port
            );
        }
    }
}

#[derive(Serialize)]
struct SlotOutput {
    index: u8,
    channel: &'static str,
    value: i32,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    port: &'a str,
    cycles: u64,
    frames_received: u64,
    malformed_frames: u64,
    sentinels_sent: u64,
    poll_timeouts: u64,
    overruns: u64,
    input: Vec<SlotOutput>,
}

pub fn print_summary(port: &str, stats: &LoopStats, input: &Register, format: OutputFormat) {
    let slots: Vec<SlotOutput> = input
        .snapshot()
        .iter()
        .zip(0..REGISTER_SLOTS as u8)
        .map(|(&value, index)| SlotOutput {
            index,
            channel: input_channel_name(index),
            value,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                port,
                cycles: stats.cycles,
                frames_received: stats.frames_received,
                malformed_frames: stats.malformed_frames,
                sentinels_sent: stats.sentinels_sent,
                poll_timeouts: stats.poll_timeouts,
                overruns: stats.overruns,
                input: slots,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut counters = new_table(vec!["COUNTER", "VALUE"]);
            for (name, value) in stat_rows(stats) {
                counters.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{counters}");

            let mut register = new_table(vec!["INDEX", "CHANNEL", "VALUE"]);
            for slot in &slots {
                register.add_row(vec![
                    slot.index.to_string(),
                    slot.channel.to_string(),
                    slot.value.to_string(),
                ]);
            }
            println!("{register}");
        }
        OutputFormat::Pretty => {
            let counters: Vec<String> = stat_rows(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("port={port} {}", counters.join(" "));
            let values: Vec<String> = slots.iter().map(|s| s.value.to_string()).collect();
            println!("input=[{}]", values.join(", "));
        }
    }
}

#[derive(Serialize)]
struct PortsOutput<'a> {
    ports: &'a [String],
}

pub fn print_ports(ports: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PortsOutput { ports }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PORT"]);
            for port in ports {
                table.add_row(vec![port.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                println!("{port}");
            }
        }
    }
}

fn stat_rows(stats: &LoopStats) -> [(&'static str, u64); 6] {
    [
        ("cycles", stats.cycles),
        ("frames_received", stats.frames_received),
        ("malformed_frames", stats.malformed_frames),
        ("sentinels_sent", stats.sentinels_sent),
        ("poll_timeouts", stats.poll_timeouts),
        ("overruns", stats.overruns),
    ]
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
