//! Client event kinds.
//!
//! Kinds are named in kebab-case (`pause-agent`). The socket event names of
//! the legacy web client (`oscMessagePauseAgent`) are accepted as aliases so
//! existing clients keep working.

use std::fmt;

/// How the relay treats an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// Exactly one message, fire-and-forget.
    Interactive,
    /// Split across many messages by the chunked stream encoder.
    Bulk,
    /// Drives the recording state machine.
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SensorUpdate,
    LoopToggle,
    AudioChunk,
    AudioDone,
    ClearBuffer,
    Play,
    AgentFeedback,
    AgentZoneFeedback,
    PauseAgent,
    RecordInHost,
    Explore,
    RecordStart,
    RecordingCaptured,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        Self::SensorUpdate,
        Self::LoopToggle,
        Self::AudioChunk,
        Self::AudioDone,
        Self::ClearBuffer,
        Self::Play,
        Self::AgentFeedback,
        Self::AgentZoneFeedback,
        Self::PauseAgent,
        Self::RecordInHost,
        Self::Explore,
        Self::RecordStart,
        Self::RecordingCaptured,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SensorUpdate => "sensor-update",
            Self::LoopToggle => "loop-toggle",
            Self::AudioChunk => "audio-chunk",
            Self::AudioDone => "audio-done",
            Self::ClearBuffer => "clear-buffer",
            Self::Play => "play",
            Self::AgentFeedback => "agent-feedback",
            Self::AgentZoneFeedback => "agent-zone-feedback",
            Self::PauseAgent => "pause-agent",
            Self::RecordInHost => "record-in-host",
            Self::Explore => "explore",
            Self::RecordStart => "record-start",
            Self::RecordingCaptured => "recording-captured",
        }
    }

    /// Socket event name used by the legacy web client, if any.
    pub fn legacy_name(self) -> Option<&'static str> {
        match self {
            Self::SensorUpdate => Some("oscMessage"),
            Self::LoopToggle => Some("oscMessageLooping"),
            Self::AudioChunk => Some("oscMessageAudioData"),
            Self::AudioDone => Some("oscMessageAudioTransmissionDone"),
            Self::ClearBuffer => Some("oscMessageClearBuffer"),
            Self::Play => Some("oscMessagePlay"),
            Self::AgentFeedback => Some("oscMessageAgentFeedback"),
            Self::AgentZoneFeedback => Some("oscMessageAgentZoneFeedback"),
            Self::PauseAgent => Some("oscMessagePauseAgent"),
            Self::RecordInHost => Some("oscMessageRecordInJUCE"),
            Self::Explore => Some("oscMessageExplore"),
            Self::RecordStart | Self::RecordingCaptured => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name || kind.legacy_name() == Some(name))
    }

    pub fn class(self) -> EventClass {
        match self {
            Self::AudioChunk => EventClass::Bulk,
            Self::RecordStart | Self::RecordingCaptured => EventClass::Recording,
            _ => EventClass::Interactive,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
