//! Client event routing, chunked sample streaming and session relaying.
//!
//! This is the layer that turns client events into OSC traffic:
//! - [`router`] decides which address and arguments each event becomes
//! - [`stream`] splits sample buffers into paced, index-tagged chunks
//! - [`recording`] tracks one client's record/upload cycle
//! - [`relay`] sequences all of the above for one client session
//! - [`server`] accepts WebSocket clients and runs a relay per connection

pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod recording;
pub mod relay;
pub mod router;
pub mod sample;
pub mod server;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{
    CaptureMode, CaptureTiming, RelayConfig, StreamConfig, DEFAULT_CHANNEL_GAP,
    DEFAULT_CHUNK_LIMIT, DEFAULT_CHUNK_PACING, DEFAULT_COMPLETION_DELAY,
};
pub use envelope::{AckStatus, ClientNotice, InboundEvent};
pub use error::{RelayError, Result};
pub use event::{EventClass, EventKind};
pub use recording::{RecordingSession, RecordingState};
pub use relay::{SessionRelay, SessionState, SessionSummary};
pub use router::{route, ChannelTransfer, Route};
pub use sample::{Channel, SampleBuffer};
pub use server::RelayServer;
pub use stream::{ChunkCursor, ChunkedStreamEncoder, StreamReport};
