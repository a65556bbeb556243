use std::net::SocketAddr;

/// Errors that can occur in datagram transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint string is not of the form `host:port`.
    #[error("invalid peer endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: &'static str },

    /// Name resolution for the peer failed or produced no address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to bind the local sending socket.
    #[error("failed to bind local socket {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The datagram could not be handed to the network stack.
    #[error("failed to send datagram to {peer}: {source}")]
    Send {
        peer: SocketAddr,
        source: std::io::Error,
    },

    /// The network stack accepted fewer bytes than the datagram holds.
    #[error("datagram truncated ({sent} of {len} bytes sent)")]
    Truncated { sent: usize, len: usize },

    /// Any other I/O error on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
