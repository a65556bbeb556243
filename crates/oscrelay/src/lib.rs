//! Relay browser client events to an OSC peer over UDP.
//!
//! oscrelay accepts WebSocket clients, turns their JSON events into OSC 1.0
//! messages and sends each message as one UDP datagram to a fixed peer.
//! Large sample buffers are split into index-tagged chunks so the peer can
//! reassemble them.
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP datagram transport to the peer
//! - [`wire`]: OSC message model and codec
//! - [`session`]: event routing, chunked streaming and the WebSocket relay
//!   (behind the `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use oscrelay_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use oscrelay_wire::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use oscrelay_session::*;
}
