use std::time::Duration;

use avionlink_control::ShutdownSignal;
use avionlink_frame::{Frame, FrameError, FramedLink};
use avionlink_transport::{LinkConfig, OpenStatus, SerialLink, DEFAULT_BAUD_RATE};
use clap::{Args, Subcommand};
use tracing::{debug, warn};

use crate::exit::{CliError, CliResult, INTERNAL, TRANSPORT_ERROR, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod ports;
pub mod run;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the control loop until Ctrl-C.
    Run(RunArgs),
    /// Send a single frame or the sentinel line.
    Send(SendArgs),
    /// Print decoded inbound frames.
    Listen(ListenArgs),
    /// List serial devices.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device (e.g. /dev/ttyACM0, COM7).
    pub port: String,
    /// Line speed in baud.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Upper bound on one blocking line read (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub read_timeout: String,
}

impl LinkArgs {
    pub fn to_config(&self) -> CliResult<LinkConfig> {
        Ok(LinkConfig {
            path: self.port.clone(),
            baud_rate: self.baud,
            read_timeout: parse_duration(&self.read_timeout)?,
            ..LinkConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Minimum cycle period in milliseconds.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub cycle_ms: u64,
    /// Stop waiting for inbound bytes after this long (e.g. 50ms). Default: wait indefinitely.
    #[arg(long)]
    pub poll_timeout: Option<String>,
    /// Input value on channel 0 that triggers the sentinel line.
    #[arg(long, default_value_t = 40, allow_negative_numbers = true)]
    pub trigger: i32,
    /// Disable the sentinel rule.
    #[arg(long, conflicts_with = "trigger")]
    pub no_rule: bool,
    /// Exit after N cycles.
    #[arg(long)]
    pub max_cycles: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Register index (0-15).
    #[arg(
        long,
        required_unless_present = "sentinel",
        requires = "value",
        value_parser = clap::value_parser!(u8).range(0..=15)
    )]
    pub index: Option<u8>,
    /// Value to send.
    #[arg(long, requires = "index", allow_negative_numbers = true)]
    pub value: Option<i32>,
    /// Send the raw sentinel line `16` instead of a frame.
    #[arg(long, conflicts_with_all = ["index", "value"])]
    pub sentinel: bool,
    /// Wait for one inbound frame and print it.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Only print these register indexes (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub index: Option<Vec<u8>>,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s` or a bare number of seconds.
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

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

/// Open the link, turning a failed open into a transport error.
pub fn open_link<L: SerialLink>(link: &mut FramedLink<L>) -> CliResult<()> {
    match link.open() {
        OpenStatus::Failed(reason) => Err(CliError::new(
            TRANSPORT_ERROR,
            format!("open {} failed: could not open port: {reason}", link.get_ref().name()),
        )),
        status => {
            debug!(port = link.get_ref().name(), %status);
            Ok(())
        }
    }
}

/// Read the next decodable frame, skipping malformed lines.
pub fn next_frame<L: SerialLink>(link: &mut FramedLink<L>) -> Result<Frame, FrameError> {
    loop {
        match link.read_frame() {
            Ok(frame) => return Ok(frame),
            Err(err) if err.is_malformed() => {
                warn!(error = %err, "skipping malformed frame");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Trigger `shutdown` on Ctrl-C.
pub fn install_ctrlc_handler(shutdown: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || shutdown.trigger()).map_err(|err| {
        CliError::new(INTERNAL, format!("signal handler setup failed: {err}"))
    })
}
