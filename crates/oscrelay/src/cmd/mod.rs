use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Subcommand};
use oscrelay_session::CaptureMode;
use oscrelay_transport::{PeerEndpoint, UdpTransport};

use crate::exit::{transport_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay: accept WebSocket clients and forward their events.
    Serve(ServeArgs),
    /// Send one interactive event to the peer.
    Send(SendArgs),
    /// Act as the peer and print received OSC messages.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PeerArgs {
    /// OSC peer to send to (host:port).
    #[arg(long, env = "OSCRELAY_PEER", default_value = "127.0.0.1:12000")]
    pub peer: PeerEndpoint,
    /// Local address to send from. Default: ephemeral port.
    #[arg(long, env = "OSCRELAY_LOCAL_ADDR", value_name = "ADDR")]
    pub local_addr: Option<SocketAddr>,
}

impl PeerArgs {
    /// Open the UDP transport to the peer.
    pub fn connect(&self) -> CliResult<UdpTransport> {
        match self.local_addr {
            Some(local) => UdpTransport::connect_with_local(self.peer.clone(), local),
            None => UdpTransport::connect(self.peer.clone()),
        }
        .map_err(|err| transport_error("peer setup failed", err))
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to accept WebSocket clients on.
    #[arg(long, env = "OSCRELAY_LISTEN", default_value = "127.0.0.1:4000")]
    pub listen: SocketAddr,
    #[command(flatten)]
    pub peer: PeerArgs,
    /// Maximum samples per chunk.
    #[arg(long, env = "OSCRELAY_CHUNK_LIMIT", default_value_t = oscrelay_session::DEFAULT_CHUNK_LIMIT)]
    pub chunk_limit: usize,
    /// Pause after each chunk (e.g. 1ms).
    #[arg(long, env = "OSCRELAY_CHUNK_PACING", default_value = "1ms")]
    pub chunk_pacing: String,
    /// Pause between the left and right channel of an upload.
    #[arg(long, env = "OSCRELAY_CHANNEL_GAP", default_value = "100ms")]
    pub channel_gap: String,
    /// Pause before the transmission-done message.
    #[arg(long, env = "OSCRELAY_COMPLETION_DELAY", default_value = "500ms")]
    pub completion_delay: String,
    /// Drop the trailing partial chunk of every transfer.
    #[arg(long, env = "OSCRELAY_DROP_TAIL")]
    pub drop_tail: bool,
    /// Where recordings are captured: server (the peer) or client.
    #[arg(long, env = "OSCRELAY_CAPTURE_MODE", default_value = "server")]
    pub capture_mode: CaptureMode,
    /// Samples per grain, for the server capture duration.
    #[arg(long, env = "OSCRELAY_GRAIN_LENGTH", default_value_t = 4096)]
    pub grain_length: u32,
    /// Grains per recording, for the server capture duration.
    #[arg(long, env = "OSCRELAY_GRAIN_COUNT", default_value_t = 33)]
    pub grain_count: u32,
    /// Peer sample rate in Hz.
    #[arg(long, env = "OSCRELAY_SAMPLE_RATE", default_value_t = 48_000)]
    pub sample_rate: u32,
    /// How long an armed client capture waits for its upload.
    #[arg(long, env = "OSCRELAY_UPLOAD_TIMEOUT", default_value = "30s")]
    pub upload_timeout: String,
    /// Events buffered per client while a transfer runs.
    #[arg(long, env = "OSCRELAY_EVENT_QUEUE_DEPTH", default_value_t = 64)]
    pub event_queue_depth: usize,
    /// Largest encoded OSC message in bytes.
    #[arg(long, env = "OSCRELAY_MAX_MESSAGE_SIZE", default_value_t = oscrelay_wire::DEFAULT_MAX_MESSAGE_SIZE)]
    pub max_message_size: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Event name (e.g. pause-agent, oscMessagePlay).
    pub event: String,
    /// Event data as a JSON object.
    #[arg(long, default_value = "{}")]
    pub data: String,
    #[command(flatten)]
    pub peer: PeerArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to receive datagrams on.
    #[arg(long, default_value = "127.0.0.1:12000")]
    pub bind: SocketAddr,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print messages for these addresses (repeatable).
    #[arg(long = "address", value_name = "PATH")]
    pub addresses: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s` or bare seconds. Zero is allowed.
pub fn parse_duration(flag: &str, input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage(format!("--{flag} must not be empty")));
    }

    let (number, from_unit): (&str, fn(u64) -> Duration) =
        if let Some(num) = input.strip_suffix("ms") {
            (num, Duration::from_millis)
        } else if let Some(num) = input.strip_suffix('s') {
            (num, Duration::from_secs)
        } else {
            (input, Duration::from_secs)
        };

    number
        .trim()
        .parse::<u64>()
        .map(from_unit)
        .map_err(|_| CliError::usage(format!("invalid duration for --{flag}: {input}")))
}
