use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::Result;

/// A fire-and-forget sink for datagrams bound for one fixed peer.
///
/// Implementations must be safe to share between sessions: `send_datagram`
/// takes `&self`, never waits on peer state and never blocks the
/// calling task. There is no receive side and
/// no acknowledgment; a successful return only means the bytes were handed to
/// the network stack.
pub trait DatagramTransport: Send + Sync {
    /// Send one complete datagram to the peer.
    fn send_datagram(&self, datagram: &[u8]) -> Result<()>;

    /// The resolved peer address datagrams are sent to.
    fn peer_addr(&self) -> SocketAddr;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for Arc<T> {
    fn send_datagram(&self, datagram: &[u8]) -> Result<()> {
        (**self).send_datagram(datagram)
    }

    fn peer_addr(&self) -> SocketAddr {
        (**self).peer_addr()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: DatagramTransport + ?Sized> DatagramTransport for &T {
    fn send_datagram(&self, datagram: &[u8]) -> Result<()> {
        (**self).send_datagram(datagram)
    }

    fn peer_addr(&self) -> SocketAddr {
        (**self).peer_addr()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
