//! JSON envelopes exchanged with WebSocket clients.
//!
//! Inbound frames look like `{"event": "pause-agent", "data": {...}, "ack": 7}`.
//! `ack` is optional; when present the relay answers with an `ack` notice
//! carrying the same id once the event has been handled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;
use crate::recording::RecordingState;

/// One client event as received on the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl InboundEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            ack: None,
        }
    }

    pub fn with_ack(mut self, id: u64) -> Self {
        self.ack = Some(id);
        self
    }

    /// Parse a text frame.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Error,
}

/// Messages the relay pushes back to its client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientNotice {
    /// Outcome of an event that asked for an acknowledgement.
    Ack {
        id: u64,
        status: AckStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The recording session moved to a new state.
    RecordingState {
        state: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<u8>,
    },
}

impl ClientNotice {
    pub fn ack_ok(id: u64) -> Self {
        Self::Ack {
            id,
            status: AckStatus::Ok,
            kind: None,
            message: None,
        }
    }

    pub fn ack_error(id: u64, err: &RelayError) -> Self {
        Self::Ack {
            id,
            status: AckStatus::Error,
            kind: Some(err.kind().to_string()),
            message: Some(err.to_string()),
        }
    }

    pub fn recording(state: RecordingState) -> Self {
        Self::RecordingState {
            state: state.name().to_string(),
            channel: state.channel().map(|c| c.index()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
