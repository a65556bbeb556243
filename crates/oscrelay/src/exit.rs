use std::fmt;
use std::io;

use oscrelay_session::RelayError;
use oscrelay_transport::TransportError;
use oscrelay_wire::WireError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidEndpoint { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        TransportError::Bind { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::Transport(err) => transport_error(context, err),
        WireError::Io(source) => io_error(context, source),
        WireError::EmptyAddress | WireError::InvalidArgumentType(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn relay_error(context: &str, err: RelayError) -> CliError {
    match err {
        RelayError::UnknownEventKind(_)
        | RelayError::InvalidArgumentType(_)
        | RelayError::EmptyAddress
        | RelayError::InvalidConfig(_) => CliError::new(USAGE, format!("{context}: {err}")),
        RelayError::TransportSendFailed(err) | RelayError::Transport(err) => {
            transport_error(context, err)
        }
        RelayError::Wire(err) => wire_error(context, err),
        RelayError::Io(source) => io_error(context, source),
        RelayError::Cancelled => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_is_a_usage_error() {
        let err = relay_error("send failed", RelayError::UnknownEventKind("x".into()));
        assert_eq!(err.code, USAGE);
        assert_eq!(err.message, "send failed: unknown event kind 'x'");
    }

    #[test]
    fn send_failures_map_to_transport_code() {
        let source = TransportError::Send {
            peer: "127.0.0.1:12000".parse().expect("valid addr"),
            source: io::Error::other("unreachable"),
        };
        let err = relay_error("send failed", RelayError::TransportSendFailed(source));
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn bad_endpoint_is_a_usage_error() {
        let err = transport_error(
            "peer",
            TransportError::InvalidEndpoint {
                input: "nope".into(),
                reason: "missing port",
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn oversized_message_is_invalid_data() {
        let err = wire_error("encode", WireError::PayloadTooLarge { size: 10, max: 1 });
        assert_eq!(err.code, DATA_INVALID);
    }
}
