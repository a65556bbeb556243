//! Connectionless datagram transport to a fixed downstream peer.
//!
//! This is the lowest layer of oscrelay. The relay only ever sends: every
//! outbound OSC message is one datagram addressed to a single
//! [`PeerEndpoint`] that is resolved once at startup. Everything above this
//! layer talks to the [`DatagramTransport`] trait, so tests can swap in an
//! in-memory sink.

pub mod endpoint;
pub mod error;
pub mod traits;
pub mod udp;

pub use endpoint::{PeerEndpoint, DEFAULT_PEER_HOST, DEFAULT_PEER_PORT};
pub use error::{Result, TransportError};
pub use traits::DatagramTransport;
pub use udp::UdpTransport;
