use futures_util::StreamExt;
use oscrelay_wire::{OscCodec, WireError, WireMessage};
use tokio::net::UdpSocket;
use tokio_util::udp::UdpFramed;
use tracing::{info, warn};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;
    runtime.block_on(listen(args, format))
}

async fn listen(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let socket = UdpSocket::bind(args.bind)
        .await
        .map_err(|err| io_error(&format!("bind {} failed", args.bind), err))?;
    let local = socket
        .local_addr()
        .map_err(|err| io_error("local address unavailable", err))?;
    info!(%local, "listening for OSC datagrams");

    let mut frames = UdpFramed::new(socket, OscCodec::new());
    let mut printed = 0usize;

    loop {
        let next = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = frames.next() => next,
        };
        let (message, from) = match next {
            Some(Ok(received)) => received,
            Some(Err(WireError::Io(err))) => return Err(io_error("receive failed", err)),
            Some(Err(err)) => {
                warn!(error = %err, "undecodable datagram skipped");
                continue;
            }
            None => break,
        };

        if !wanted(&args.addresses, &message) {
            continue;
        }

        print_message(&message, from, format);
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    Ok(SUCCESS)
}

fn wanted(filter: &[String], message: &WireMessage) -> bool {
    filter.is_empty() || filter.iter().any(|address| address == message.address())
}

#[cfg(test)]
mod tests {
    use oscrelay_wire::address;

    use super::*;

    #[test]
    fn empty_filter_accepts_everything() {
        let msg = WireMessage::new(address::PLAY, vec![]).expect("valid message");
        assert!(wanted(&[], &msg));
    }

    #[test]
    fn filter_matches_exact_addresses() {
        let msg = WireMessage::new(address::PLAY, vec![]).expect("valid message");
        assert!(wanted(&[address::PLAY.to_string()], &msg));
        assert!(!wanted(&[address::EXPLORE.to_string()], &msg));
        assert!(!wanted(&["/osc_from_js_PLAY".to_string()], &msg));
    }
}
