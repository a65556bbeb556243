use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_message, encode_message, DEFAULT_MAX_MESSAGE_SIZE};
use crate::error::{Result, WireError};
use crate::message::WireMessage;

/// `tokio_util` codec for one OSC message per datagram.
///
/// Intended for `tokio_util::udp::UdpFramed`, which hands the decoder exactly
/// one datagram at a time. The whole buffer is consumed on every call, even
/// when it does not decode, so a bad datagram never poisons the next one.
#[derive(Debug, Clone)]
pub struct OscCodec {
    max_message_size: usize,
}

impl OscCodec {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self { max_message_size }
    }
}

impl Default for OscCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for OscCodec {
    type Item = WireMessage;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<WireMessage>> {
        if src.is_empty() {
            return Ok(None);
        }
        let datagram = src.split();
        if datagram.len() > self.max_message_size {
            return Err(WireError::PayloadTooLarge {
                size: datagram.len(),
                max: self.max_message_size,
            });
        }
        decode_message(&datagram).map(Some)
    }
}

impl Encoder<WireMessage> for OscCodec {
    type Error = WireError;

    fn encode(&mut self, item: WireMessage, dst: &mut BytesMut) -> Result<()> {
        encode_message(&item, self.max_message_size, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio::net::UdpSocket;
    use tokio_util::udp::UdpFramed;

    use super::*;
    use crate::address;
    use crate::message::TypedValue;

    #[test]
    fn decoder_consumes_whole_datagram() {
        let msg = WireMessage::new(address::PAUSE_AGENT, vec![TypedValue::Int32(1)]).unwrap();
        let mut buf = BytesMut::new();
        OscCodec::new().encode(msg.clone(), &mut buf).unwrap();

        let decoded = OscCodec::new().decode(&mut buf).unwrap();
        assert_eq!(decoded, Some(msg));
        assert!(buf.is_empty());
    }

    #[test]
    fn bad_datagram_is_discarded() {
        let mut buf = BytesMut::from(&b"garbage"[..]);
        assert!(OscCodec::new().decode(&mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut buf = BytesMut::new();
        assert!(OscCodec::new().decode(&mut buf).unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_over_udp_framed() {
        let a = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let b_addr = b.local_addr().unwrap();

        let mut tx = UdpFramed::new(a, OscCodec::new());
        let mut rx = UdpFramed::new(b, OscCodec::new());

        let msg = WireMessage::new(address::SENSOR, vec![TypedValue::Float32(0.5)]).unwrap();
        tx.send((msg.clone(), b_addr)).await.unwrap();

        let (received, _from) = rx.next().await.unwrap().unwrap();
        assert_eq!(received, msg);
    }
}
