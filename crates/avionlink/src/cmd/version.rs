use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("avionlink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: avionlink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("AVIONLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("AVIONLINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "defaults: baud={}, cycle_period_ms={}, max_line_len={}",
        avionlink_transport::DEFAULT_BAUD_RATE,
        avionlink_control::DEFAULT_CYCLE_PERIOD.as_millis(),
        avionlink_transport::DEFAULT_MAX_LINE_LEN
    );

    Ok(SUCCESS)
}
