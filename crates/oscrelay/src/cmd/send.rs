use oscrelay_session::{route, Route};
use oscrelay_transport::DatagramTransport;
use oscrelay_wire::{MessageWriter, WireMessage};
use serde_json::Value;
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{relay_error, wire_error, CliError, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let data: Value = serde_json::from_str(&args.data)
        .map_err(|err| CliError::usage(format!("--data is not valid JSON: {err}")))?;
    let message = interactive_message(&args.event, &data)?;

    let transport = args.peer.connect()?;
    let peer = transport.peer_addr();
    let mut writer = MessageWriter::new(transport);
    writer
        .send(&message)
        .map_err(|err| wire_error("send failed", err))?;

    info!(event = %args.event, address = message.address(), %peer, "event sent");
    print_message(&message, peer, format);
    Ok(SUCCESS)
}

/// Only interactive events map to a single message; the rest need a session.
fn interactive_message(event: &str, data: &Value) -> CliResult<WireMessage> {
    match route(event, data).map_err(|err| relay_error("invalid event", err))? {
        Route::Interactive { message, .. } => Ok(message),
        _ => Err(CliError::usage(format!(
            "'{event}' needs a client session; connect through `oscrelay serve` instead"
        ))),
    }
}
