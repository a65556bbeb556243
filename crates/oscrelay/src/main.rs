mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "oscrelay",
    version,
    about = "Relay WebSocket client events to an OSC peer over UDP"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "OSCRELAY_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "oscrelay",
            "send",
            "pause-agent",
            "--data",
            "{\"isPaused\":true}",
            "--peer",
            "127.0.0.1:9000",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.event, "pause-agent");
                assert_eq!(args.peer.peer.port(), 9000);
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_peer() {
        let err = Cli::try_parse_from(["oscrelay", "send", "play", "--peer", "localhost"])
            .expect_err("peer without port should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_serve_with_capture_mode() {
        let cli = Cli::try_parse_from([
            "oscrelay",
            "serve",
            "--listen",
            "0.0.0.0:4000",
            "--capture-mode",
            "client",
            "--log-level",
            "debug",
        ])
        .expect("serve args should parse");
        assert!(matches!(cli.command, Command::Serve(_)));
    }

    #[test]
    fn rejects_unknown_capture_mode() {
        let err = Cli::try_parse_from(["oscrelay", "serve", "--capture-mode", "phone"])
            .expect_err("unknown capture mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_listen_filters() {
        let cli = Cli::try_parse_from([
            "oscrelay",
            "listen",
            "--bind",
            "127.0.0.1:0",
            "--count",
            "2",
            "--address",
            "/osc_from_js_play",
            "--address",
            "/osc_from_js_explore",
        ])
        .expect("listen args should parse");
        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.count, Some(2));
                assert_eq!(args.addresses.len(), 2);
            }
            other => panic!("expected listen, got {other:?}"),
        }
    }
}
