/// Errors that can occur while building, encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The address path is empty or whitespace.
    #[error("message address is empty")]
    EmptyAddress,

    /// An argument is not an Int32 or Float32, or its value cannot be
    /// represented as the declared type.
    #[error("invalid argument type: {0}")]
    InvalidArgumentType(String),

    /// The encoded message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The datagram ended before the message was complete.
    #[error("truncated message (needed {needed} bytes at offset {offset})")]
    Truncated { offset: usize, needed: usize },

    /// A string field has no NUL terminator.
    #[error("unterminated string at offset {0}")]
    UnterminatedString(usize),

    /// The type-tag string is missing or does not start with ','.
    #[error("missing type tag string")]
    MissingTypeTags,

    /// The address or type tags are not valid UTF-8.
    #[error("invalid UTF-8 in message string")]
    InvalidUtf8,

    /// Bytes remain after the last declared argument.
    #[error("{0} trailing bytes after last argument")]
    TrailingBytes(usize),

    /// The transport refused the encoded datagram.
    #[error("transport error: {0}")]
    Transport(#[from] oscrelay_transport::TransportError),

    /// An I/O error surfaced through a framed stream.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
