use std::net::SocketAddr;
use std::sync::Arc;

use oscrelay_session::{CaptureTiming, RelayConfig, RelayServer, StreamConfig};
use oscrelay_transport::DatagramTransport;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cmd::{parse_duration, ServeArgs};
use crate::exit::{io_error, relay_error, CliResult, SUCCESS};

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = relay_config(&args)?;
    let transport: Arc<dyn DatagramTransport> = Arc::new(args.peer.connect()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;
    runtime.block_on(serve(args.listen, transport, config))
}

async fn serve(
    listen: SocketAddr,
    transport: Arc<dyn DatagramTransport>,
    config: RelayConfig,
) -> CliResult<i32> {
    let server = RelayServer::bind(listen, transport, config)
        .await
        .map_err(|err| relay_error("bind failed", err))?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                trigger.cancel();
            }
            Err(err) => warn!(error = %err, "ctrl-c handler unavailable"),
        }
    });

    server
        .serve(shutdown)
        .await
        .map_err(|err| relay_error("relay failed", err))?;
    Ok(SUCCESS)
}

/// Build and validate the relay configuration from flags.
fn relay_config(args: &ServeArgs) -> CliResult<RelayConfig> {
    let config = RelayConfig {
        stream: StreamConfig {
            chunk_limit: args.chunk_limit,
            pacing: parse_duration("chunk-pacing", &args.chunk_pacing)?,
            flush_tail: !args.drop_tail,
        },
        channel_gap: parse_duration("channel-gap", &args.channel_gap)?,
        completion_delay: parse_duration("completion-delay", &args.completion_delay)?,
        capture_mode: args.capture_mode,
        capture: CaptureTiming {
            grain_length: args.grain_length,
            grain_count: args.grain_count,
            sample_rate: args.sample_rate,
        },
        upload_timeout: parse_duration("upload-timeout", &args.upload_timeout)?,
        event_queue_depth: args.event_queue_depth,
        max_message_size: args.max_message_size,
    };
    config
        .validate()
        .map_err(|err| relay_error("invalid configuration", err))?;
    Ok(config)
}
