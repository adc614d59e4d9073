use avionlink_control::ShutdownSignal;
use avionlink_frame::{FrameError, FramedLink};
use avionlink_transport::{SerialLink, SerialPortLink, TransportError};

use crate::cmd::{install_ctrlc_handler, next_frame, open_link, ListenArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let mut link = FramedLink::new(SerialPortLink::new(args.link.to_config()?));
    open_link(&mut link)?;

    let result = listen(&mut link, &args, &shutdown, format);
    link.close();
    result.map(|_| SUCCESS)
}

/// Print frames until shutdown or `--count`; returns how many were printed.
fn listen<L: SerialLink>(
    link: &mut FramedLink<L>,
    args: &ListenArgs,
    shutdown: &ShutdownSignal,
    format: OutputFormat,
) -> CliResult<usize> {
    let mut printed = 0usize;

    while !shutdown.is_triggered() {
        let frame = match next_frame(link) {
            Ok(frame) => frame,
            Err(FrameError::Transport(TransportError::Timeout(_))) => continue,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        if let Some(indexes) = &args.index {
            if !indexes.contains(&frame.index) {
                continue;
            }
        }

        print_frame(&frame, &args.link.port, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    Ok(printed)
}
