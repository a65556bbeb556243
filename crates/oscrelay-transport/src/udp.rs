use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use tracing::{debug, info, trace};

use crate::endpoint::PeerEndpoint;
use crate::error::{Result, TransportError};
use crate::traits::DatagramTransport;

/// UDP transport to a fixed peer.
///
/// The socket library needs a bound local port before it can send, so the
/// transport binds one privately when it is created. Nothing is ever read
/// from that port.
///
/// The socket is non-blocking: a full send buffer fails the datagram with
/// `TransportError::Send` instead of stalling the calling task.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    endpoint: PeerEndpoint,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Resolve `endpoint` and bind an ephemeral local port of the same
    /// address family.
    pub fn connect(endpoint: PeerEndpoint) -> Result<Self> {
        let peer = endpoint.resolve()?;
        let local = match peer.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        Self::bind(endpoint, peer, local)
    }

    /// Resolve `endpoint` and bind an explicit local address.
    pub fn connect_with_local(endpoint: PeerEndpoint, local: SocketAddr) -> Result<Self> {
        let peer = endpoint.resolve()?;
        Self::bind(endpoint, peer, local)
    }

    fn bind(endpoint: PeerEndpoint, peer: SocketAddr, local: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(local).map_err(|source| TransportError::Bind {
            addr: local,
            source,
        })?;
        socket.set_nonblocking(true)?;
        let bound = socket.local_addr()?;

        info!(%endpoint, %peer, local = %bound, "udp transport ready");

        Ok(Self {
            socket,
            endpoint,
            peer,
        })
    }

    /// The configured (unresolved) endpoint.
    pub fn endpoint(&self) -> &PeerEndpoint {
        &self.endpoint
    }

    /// The local address the private sending socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(Into::into)
    }
}

impl DatagramTransport for UdpTransport {
    fn send_datagram(&self, datagram: &[u8]) -> Result<()> {
        let sent = self
            .socket
            .send_to(datagram, self.peer)
            .map_err(|source| TransportError::Send {
                peer: self.peer,
                source,
            })?;
        if sent != datagram.len() {
            debug!(sent, len = datagram.len(), "short datagram write");
            return Err(TransportError::Truncated {
                sent,
                len: datagram.len(),
            });
        }
        trace!(bytes = sent, peer = %self.peer, "datagram sent");
        Ok(())
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn transport_name(&self) -> &'static str {
        "udp"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn receiver() -> (UdpSocket, PeerEndpoint) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let endpoint = PeerEndpoint::from(socket.local_addr().unwrap());
        (socket, endpoint)
    }

    #[test]
    fn sends_one_datagram_per_call() {
        let (peer, endpoint) = receiver();
        let transport = UdpTransport::connect(endpoint).unwrap();

        transport.send_datagram(b"first").unwrap();
        transport.send_datagram(b"second").unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"first");
        assert_eq!(from.port(), transport.local_addr().unwrap().port());

        let (n, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"second");
    }

    #[test]
    fn binds_explicit_local_address() {
        let (_peer, endpoint) = receiver();
        let local: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let transport = UdpTransport::connect_with_local(endpoint.clone(), local).unwrap();

        assert_eq!(transport.endpoint(), &endpoint);
        assert_eq!(transport.peer_addr(), endpoint.resolve().unwrap());
        assert_eq!(transport.transport_name(), "udp");
    }

    #[test]
    fn bind_conflict_is_reported() {
        let taken = UdpSocket::bind("127.0.0.1:0").unwrap();
        let local = taken.local_addr().unwrap();
        let (_peer, endpoint) = receiver();

        let err = UdpTransport::connect_with_local(endpoint, local).unwrap_err();
        assert!(matches!(err, TransportError::Bind { .. }));
    }

    #[test]
    fn oversized_datagram_fails_to_send() {
        let (_peer, endpoint) = receiver();
        let transport = UdpTransport::connect(endpoint).unwrap();

        let err = transport.send_datagram(&vec![0u8; 70_000]).unwrap_err();
        assert!(matches!(err, TransportError::Send { .. }));
    }

    #[test]
    fn sending_socket_never_blocks() {
        let (_peer, endpoint) = receiver();
        let transport = UdpTransport::connect(endpoint).unwrap();

        let mut buf = [0u8; 16];
        let err = transport.socket.recv_from(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }

    #[test]
    fn usable_through_shared_handle() {
        let (peer, endpoint) = receiver();
        let shared: std::sync::Arc<dyn DatagramTransport> =
            std::sync::Arc::new(UdpTransport::connect(endpoint).unwrap());

        shared.send_datagram(b"shared").unwrap();

        let mut buf = [0u8; 16];
        let (n, _) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"shared");
    }
}
