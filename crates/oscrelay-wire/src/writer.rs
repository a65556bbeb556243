use bytes::BytesMut;
use oscrelay_transport::DatagramTransport;
use tracing::trace;

use crate::codec::{encode_message, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::Result;
use crate::message::WireMessage;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Encodes messages and sends each one as a single datagram.
///
/// The encode buffer is reused across sends. A message is either encoded in
/// full and handed to the transport, or rejected before anything is sent.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    max_message_size: usize,
    sent: u64,
}

impl<T: DatagramTransport> MessageWriter<T> {
    /// Create a writer with the default maximum message size.
    pub fn new(inner: T) -> Self {
        Self::with_max_message_size(inner, DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a writer with an explicit maximum message size.
    pub fn with_max_message_size(inner: T, max_message_size: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_message_size,
            sent: 0,
        }
    }

    /// Encode and send one message.
    pub fn send(&mut self, msg: &WireMessage) -> Result<()> {
        self.buf.clear();
        encode_message(msg, self.max_message_size, &mut self.buf)?;
        self.inner.send_datagram(&self.buf)?;
        self.sent += 1;
        trace!(
            address = msg.address(),
            args = msg.args().len(),
            bytes = self.buf.len(),
            "message sent"
        );
        Ok(())
    }

    /// Number of messages handed to the transport so far.
    pub fn messages_sent(&self) -> u64 {
        self.sent
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current maximum encoded message size.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}
