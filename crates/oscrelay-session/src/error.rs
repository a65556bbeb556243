use oscrelay_transport::TransportError;
use oscrelay_wire::WireError;

use crate::recording::RecordingState;

/// Errors that can occur while relaying client events.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The client sent an event name the router does not know.
    #[error("unknown event kind '{0}'")]
    UnknownEventKind(String),

    /// An event argument is missing or has the wrong type.
    #[error("invalid argument type: {0}")]
    InvalidArgumentType(String),

    /// A message was built with a blank address.
    #[error("message address is empty")]
    EmptyAddress,

    /// The transport refused a datagram; the current transfer was aborted.
    #[error("transport send failed: {0}")]
    TransportSendFailed(#[source] TransportError),

    /// The event is not valid in the current recording state.
    #[error("recording session is {state}, cannot {action}")]
    InvalidRecordingState {
        state: RecordingState,
        action: &'static str,
    },

    /// The session queue was full; the event was dropped unhandled.
    #[error("event queue full, '{0}' dropped")]
    EventQueueFull(String),

    /// The client disconnected while a transfer was in flight.
    #[error("transfer cancelled")]
    Cancelled,

    /// Any other codec failure (oversized message and so on).
    #[error("wire error: {0}")]
    Wire(WireError),

    /// The relay configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Socket error on the client side of the relay.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl RelayError {
    /// Stable label used in acks and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownEventKind(_) => "unknown-event-kind",
            Self::InvalidArgumentType(_) => "invalid-argument-type",
            Self::EmptyAddress => "empty-address",
            Self::TransportSendFailed(_) => "transport-send-failed",
            Self::InvalidRecordingState { .. } => "invalid-recording-state",
            Self::EventQueueFull(_) => "event-queue-full",
            Self::Cancelled => "cancelled",
            Self::Wire(_) => "wire",
            Self::InvalidConfig(_) => "invalid-config",
            Self::Transport(_) => "transport",
            Self::Io(_) => "io",
            Self::WebSocket(_) => "websocket",
        }
    }
}

impl From<WireError> for RelayError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::EmptyAddress => Self::EmptyAddress,
            WireError::InvalidArgumentType(detail) => Self::InvalidArgumentType(detail),
            WireError::Transport(source) => Self::TransportSendFailed(source),
            other => Self::Wire(other),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RelayError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
