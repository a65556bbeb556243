use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use oscrelay_wire::DEFAULT_MAX_MESSAGE_SIZE;

use crate::error::{RelayError, Result};

/// Maximum sample slots per chunk, not counting the leading index slot.
pub const DEFAULT_CHUNK_LIMIT: usize = 100;

/// Pause after every emitted chunk.
pub const DEFAULT_CHUNK_PACING: Duration = Duration::from_millis(1);

/// Pause between the left and right channel transfers.
pub const DEFAULT_CHANNEL_GAP: Duration = Duration::from_millis(100);

/// Pause between the last right-channel chunk and the done message.
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(500);

/// How long an armed client-capture session waits for its upload.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Events buffered per session while a transfer is in flight.
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 64;

/// Longest channel-data address, used to size the largest chunk.
const CHANNEL_ADDRESS_LEN: usize = oscrelay_wire::address::RIGHT_CHANNEL_DATA.len();

/// Where recordings are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// The peer records natively; no samples pass through the relay.
    #[default]
    Server,
    /// The client records and uploads both channels through the relay.
    Client,
}

impl CaptureMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" | "host" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            other => Err(format!(
                "unknown capture mode '{other}' (expected 'server' or 'client')"
            )),
        }
    }
}

/// Length of one recording: `grain_length * grain_count / sample_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTiming {
    /// Samples per grain.
    pub grain_length: u32,
    /// Grains per recorded trajectory.
    pub grain_count: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl CaptureTiming {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let samples = u64::from(self.grain_length) * u64::from(self.grain_count);
        Duration::from_secs_f64(samples as f64 / f64::from(self.sample_rate))
    }
}

impl Default for CaptureTiming {
    fn default() -> Self {
        Self {
            grain_length: 4096,
            grain_count: 33,
            sample_rate: 48_000,
        }
    }
}

/// Chunking and pacing for one channel transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Maximum sample slots per chunk.
    pub chunk_limit: usize,
    /// Pause after each chunk boundary.
    pub pacing: Duration,
    /// Send the trailing partial chunk instead of dropping it.
    pub flush_tail: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            pacing: DEFAULT_CHUNK_PACING,
            flush_tail: true,
        }
    }
}

/// Relay behavior shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub stream: StreamConfig,
    pub channel_gap: Duration,
    pub completion_delay: Duration,
    pub capture_mode: CaptureMode,
    pub capture: CaptureTiming,
    pub upload_timeout: Duration,
    pub event_queue_depth: usize,
    pub max_message_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            channel_gap: DEFAULT_CHANNEL_GAP,
            completion_delay: DEFAULT_COMPLETION_DELAY,
            capture_mode: CaptureMode::default(),
            capture: CaptureTiming::default(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            event_queue_depth: DEFAULT_EVENT_QUEUE_DEPTH,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl RelayConfig {
    /// Reject settings the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RelayError::InvalidConfig(msg));

        if self.stream.chunk_limit == 0 {
            return invalid("chunk limit must be at least 1".into());
        }
        let largest = largest_chunk_size(self.stream.chunk_limit);
        if largest > self.max_message_size {
            return invalid(format!(
                "a full chunk of {} samples encodes to {largest} bytes, above the {} byte message limit",
                self.stream.chunk_limit, self.max_message_size
            ));
        }
        if self.capture.sample_rate == 0 {
            return invalid("sample rate must be non-zero".into());
        }
        if self.capture.grain_length == 0 || self.capture.grain_count == 0 {
            return invalid("grain length and grain count must be non-zero".into());
        }
        if self.event_queue_depth == 0 {
            return invalid("event queue depth must be at least 1".into());
        }
        Ok(())
    }
}

/// Encoded size of a channel-data message carrying `chunk_limit` samples.
fn largest_chunk_size(chunk_limit: usize) -> usize {
    let pad = |n: usize| (n + 3) & !3;
    let slots = chunk_limit + 1;
    pad(CHANNEL_ADDRESS_LEN + 1) + pad(slots + 2) + 4 * slots
}
