use std::time::Duration;

use avionlink_control::{CommandRule, ControllerConfig, LoopController, ShutdownSignal};
use avionlink_frame::STICK_X;
use avionlink_transport::SerialPortLink;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, parse_duration, RunArgs};
use crate::exit::{control_error, CliResult, SUCCESS};
use crate::output::{print_summary, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let link_config = args.link.to_config()?;
    let config = controller_config(&args)?;

    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let mut controller = LoopController::new(SerialPortLink::new(link_config), config);
    let status = controller
        .try_start()
        .map_err(|err| control_error("open failed", err))?;
    info!(port = %args.link.port, %status, "bridge ready");

    let stats = controller
        .run(&shutdown)
        .map_err(|err| control_error("control loop failed", err))?;

    print_summary(
        &args.link.port,
        &stats,
        &controller.registers().input,
        format,
    );
    Ok(SUCCESS)
}

fn controller_config(args: &RunArgs) -> CliResult<ControllerConfig> {
    let poll_timeout = args
        .poll_timeout
        .as_deref()
        .map(parse_duration)
        .transpose()?;
    let rule = (!args.no_rule).then_some(CommandRule {
        channel: STICK_X,
        trigger: args.trigger,
    });

    Ok(ControllerConfig {
        cycle_period: Duration::from_millis(args.cycle_ms),
        poll_timeout,
        rule,
        max_cycles: args.max_cycles,
        ..ControllerConfig::default()
    })
}
