use std::net::SocketAddr;
use std::sync::Mutex;

use oscrelay_transport::{DatagramTransport, TransportError};
use oscrelay_wire::{decode_message, WireMessage};

/// Keeps every datagram it is handed; can be told to start failing.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    datagrams: Mutex<Vec<Vec<u8>>>,
    fail_after: Option<usize>,
}

impl RecordingTransport {
    /// Accept `n` datagrams, then refuse every later one.
    pub(crate) fn failing_after(n: usize) -> Self {
        Self {
            datagrams: Mutex::default(),
            fail_after: Some(n),
        }
    }

    pub(crate) fn messages(&self) -> Vec<WireMessage> {
        self.datagrams
            .lock()
            .unwrap()
            .iter()
            .map(|d| decode_message(d).unwrap())
            .collect()
    }

    pub(crate) fn addresses(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|m| m.address().to_string())
            .collect()
    }
}

impl DatagramTransport for RecordingTransport {
    fn send_datagram(&self, datagram: &[u8]) -> oscrelay_transport::Result<()> {
        let mut datagrams = self.datagrams.lock().unwrap();
        if self.fail_after.is_some_and(|n| datagrams.len() >= n) {
            return Err(TransportError::Io(std::io::Error::other("peer unreachable")));
        }
        datagrams.push(datagram.to_vec());
        Ok(())
    }

    fn peer_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 12000))
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}
