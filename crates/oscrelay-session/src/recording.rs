//! Per-client recording state machine.
//!
//! ```text
//! Idle --arm--> Armed --(client) begin_channel--> Streaming(Left)
//!                 |                                   |
//!                 |                         begin_channel
//!                 |                                   v
//!                 |                             Streaming(Right)
//!                 |                                   |
//!                 +--(server) complete--> Completed <-+ complete
//! ```
//!
//! The session only tracks state and deadlines; the relay performs the sends
//! and waits and decides when a completed session goes back to idle.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{CaptureMode, CaptureTiming};
use crate::error::{RelayError, Result};
use crate::sample::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Armed,
    Streaming(Channel),
    Completed,
}

impl RecordingState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Streaming(_) => "streaming",
            Self::Completed => "completed",
        }
    }

    pub fn channel(self) -> Option<Channel> {
        match self {
            Self::Streaming(channel) => Some(channel),
            _ => None,
        }
    }

    /// True for every state a new record-start must not interrupt.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(channel) => write!(f, "streaming {channel}"),
            other => f.write_str(other.name()),
        }
    }
}

/// One record/upload cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    state: RecordingState,
    mode: CaptureMode,
    deadline: Option<Instant>,
}

impl RecordingSession {
    /// Start a session in `Armed`.
    ///
    /// In server mode the deadline is when the peer's native capture ends.
    /// In client mode it bounds the wait for the upload.
    pub fn arm(
        mode: CaptureMode,
        timing: &CaptureTiming,
        upload_timeout: Duration,
        now: Instant,
    ) -> Self {
        let wait = match mode {
            CaptureMode::Server => timing.duration(),
            CaptureMode::Client => upload_timeout,
        };
        Self {
            state: RecordingState::Armed,
            mode,
            deadline: Some(now + wait),
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// When the relay has to act on this session without a client event.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Move to streaming `channel`. Client capture only, left before right.
    pub fn begin_channel(&mut self, channel: Channel) -> Result<()> {
        let next = match (self.mode, self.state, channel) {
            (CaptureMode::Client, RecordingState::Armed, Channel::Left) => {
                RecordingState::Streaming(Channel::Left)
            }
            (CaptureMode::Client, RecordingState::Streaming(Channel::Left), Channel::Right) => {
                RecordingState::Streaming(Channel::Right)
            }
            _ => return Err(self.invalid("stream this channel")),
        };
        self.state = next;
        self.deadline = None;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        let done = matches!(
            (self.mode, self.state),
            (CaptureMode::Client, RecordingState::Streaming(Channel::Right))
                | (CaptureMode::Server, RecordingState::Armed)
        );
        if !done {
            return Err(self.invalid("complete"));
        }
        self.state = RecordingState::Completed;
        self.deadline = None;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> RelayError {
        RelayError::InvalidRecordingState {
            state: self.state,
            action,
        }
    }
}
