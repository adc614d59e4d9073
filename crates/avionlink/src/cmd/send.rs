use avionlink_frame::FramedLink;
use avionlink_transport::{SerialLink, SerialPortLink};

use crate::cmd::{next_frame, open_link, SendArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let mut link = FramedLink::new(SerialPortLink::new(args.link.to_config()?));
    open_link(&mut link)?;

    let result = send_and_wait(&mut link, &args, format);
    link.close();
    result.map(|()| SUCCESS)
}

fn send_and_wait<L: SerialLink>(
    link: &mut FramedLink<L>,
    args: &SendArgs,
    format: OutputFormat,
) -> CliResult<()> {
    send_payload(link, args)?;

    if args.wait {
        let frame = next_frame(link).map_err(|err| frame_error("receive failed", err))?;
        print_frame(&frame, &args.link.port, format);
    }
    Ok(())
}

fn send_payload<L: SerialLink>(link: &mut FramedLink<L>, args: &SendArgs) -> CliResult<()> {
    if args.sentinel {
        return link
            .send_sentinel()
            .map_err(|err| frame_error("send failed", err));
    }

    match (args.index, args.value) {
        (Some(index), Some(value)) => link
            .send(value, index)
            .map_err(|err| frame_error("send failed", err)),
        _ => Err(CliError::new(
            USAGE,
            "either --sentinel or both --index and --value are required",
        )),
    }
}
