//! Event-to-message translation.
//!
//! This module is the only place that knows which address and argument
//! layout each client event becomes. The relay asks it for every message it
//! sends, including the ones it emits on its own (chunks, done, capture).

use oscrelay_wire::{address, ArgType, TypedValue, WireMessage};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::event::EventKind;
use crate::sample::{Channel, SampleBuffer};

/// How one argument is pulled out of the event data.
struct ArgRule {
    /// Accepted field names, first match wins.
    fields: &'static [&'static str],
    ty: ArgType,
    /// Used when none of the fields are present.
    default: Option<TypedValue>,
}

const fn required(fields: &'static [&'static str], ty: ArgType) -> ArgRule {
    ArgRule {
        fields,
        ty,
        default: None,
    }
}

const VALUE_F: &[ArgRule] = &[required(&["value"], ArgType::Float32)];
const VALUE_I: &[ArgRule] = &[required(&["value"], ArgType::Int32)];
const DONE_I: &[ArgRule] = &[ArgRule {
    fields: &["value"],
    ty: ArgType::Int32,
    default: Some(TypedValue::Int32(0)),
}];
const FEEDBACK_I: &[ArgRule] = &[required(&["feedback"], ArgType::Int32)];
const PAUSED_I: &[ArgRule] = &[required(&["isPaused", "isAgentPaused"], ArgType::Int32)];
const NO_ARGS: &[ArgRule] = &[];

/// Address and argument layout of an interactive event.
fn recipe(kind: EventKind) -> Option<(&'static str, &'static [ArgRule])> {
    let recipe = match kind {
        EventKind::SensorUpdate => (address::SENSOR, VALUE_F),
        EventKind::LoopToggle => (address::IS_LOOPING, VALUE_I),
        EventKind::AudioDone => (address::AUDIO_TRANSMISSION_DONE, DONE_I),
        EventKind::ClearBuffer => (address::CLEAR_RECORDING_BUFFER, NO_ARGS),
        EventKind::Play => (address::PLAY, NO_ARGS),
        EventKind::AgentFeedback => (address::AGENT_FEEDBACK, FEEDBACK_I),
        EventKind::AgentZoneFeedback => (address::AGENT_ZONE_FEEDBACK, FEEDBACK_I),
        EventKind::PauseAgent => (address::PAUSE_AGENT, PAUSED_I),
        EventKind::RecordInHost => (address::RECORD_IN_HOST, NO_ARGS),
        EventKind::Explore => (address::EXPLORE, NO_ARGS),
        EventKind::AudioChunk | EventKind::RecordStart | EventKind::RecordingCaptured => {
            return None
        }
    };
    Some(recipe)
}

/// One channel's worth of samples to stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelTransfer {
    pub channel: Channel,
    /// Absolute index of the first sample to send.
    pub start_index: usize,
    pub samples: SampleBuffer,
}

/// What the relay has to do for an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Send exactly this message.
    Interactive {
        kind: EventKind,
        message: WireMessage,
    },
    /// Stream one channel through the chunked encoder.
    Bulk(ChannelTransfer),
    /// Arm a recording session.
    RecordStart,
    /// Stream a client-captured recording, left then right.
    RecordingCaptured {
        left: SampleBuffer,
        right: SampleBuffer,
    },
}

/// Classify an event and build everything needed to relay it.
///
/// Unknown names fail with `UnknownEventKind`; bad or missing arguments fail
/// with `InvalidArgumentType`. Either way nothing has been sent.
pub fn route(name: &str, data: &Value) -> Result<Route> {
    let kind =
        EventKind::from_name(name).ok_or_else(|| RelayError::UnknownEventKind(name.to_string()))?;

    let route = match kind {
        EventKind::AudioChunk => Route::Bulk(channel_transfer(data)?),
        EventKind::RecordStart => Route::RecordStart,
        EventKind::RecordingCaptured => {
            let fields = object(data)?;
            Route::RecordingCaptured {
                left: samples(required_field(fields, &["left"])?, "left")?,
                right: samples(required_field(fields, &["right"])?, "right")?,
            }
        }
        _ => Route::Interactive {
            kind,
            message: interactive(kind, data)?,
        },
    };
    debug!(event = %kind, "event routed");
    Ok(route)
}

/// Build the single message for an interactive event.
pub fn interactive(kind: EventKind, data: &Value) -> Result<WireMessage> {
    let (address, rules) = recipe(kind).ok_or_else(|| {
        RelayError::InvalidArgumentType(format!("'{kind}' is not an interactive event"))
    })?;

    let args = if rules.is_empty() {
        Vec::new()
    } else {
        let fields = object(data)?;
        rules
            .iter()
            .map(|rule| match find_field(fields, rule.fields) {
                Some(value) => TypedValue::from_json(rule.ty, value).map_err(|err| {
                    RelayError::InvalidArgumentType(format!("{}: {err}", rule.fields[0]))
                }),
                None => rule.default.ok_or_else(|| missing(rule.fields)),
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(WireMessage::new(address, args)?)
}

/// Address that carries `channel`'s samples.
pub fn channel_address(channel: Channel) -> &'static str {
    match channel {
        Channel::Left => address::LEFT_CHANNEL_DATA,
        Channel::Right => address::RIGHT_CHANNEL_DATA,
    }
}

/// A sample chunk: `args` must already lead with the Int32 index slot.
pub fn channel_chunk(channel: Channel, args: Vec<TypedValue>) -> Result<WireMessage> {
    Ok(WireMessage::new(channel_address(channel), args)?)
}

/// End of a client-captured upload.
pub fn transmission_done(value: i32) -> Result<WireMessage> {
    Ok(WireMessage::new(
        address::AUDIO_TRANSMISSION_DONE,
        vec![TypedValue::Int32(value)],
    )?)
}

/// Ask the peer to record natively.
pub fn record_in_host() -> Result<WireMessage> {
    Ok(WireMessage::new(address::RECORD_IN_HOST, Vec::new())?)
}

/// Ask the peer to discard its recording buffer before an upload.
pub fn clear_recording_buffer() -> Result<WireMessage> {
    Ok(WireMessage::new(address::CLEAR_RECORDING_BUFFER, Vec::new())?)
}

/// `audio-chunk` data: `{channel, startIndex, samples}` or the positional
/// `[channel, startIndex, samples]` form older clients emit.
fn channel_transfer(data: &Value) -> Result<ChannelTransfer> {
    let (channel, start, buffer) = match data {
        Value::Array(items) if items.len() == 3 => (&items[0], Some(&items[1]), &items[2]),
        Value::Array(items) => {
            return Err(RelayError::InvalidArgumentType(format!(
                "positional audio-chunk needs 3 items, got {}",
                items.len()
            )))
        }
        _ => {
            let fields = object(data)?;
            (
                required_field(fields, &["channel"])?,
                find_field(fields, &["startIndex", "start_index", "bufferIdx"]),
                required_field(fields, &["samples", "buffer"])?,
            )
        }
    };

    let channel = channel
        .as_i64()
        .and_then(Channel::from_index)
        .ok_or_else(|| RelayError::InvalidArgumentType("channel must be 0 or 1".into()))?;

    let start_index = match start {
        None => 0,
        Some(value) => value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                RelayError::InvalidArgumentType(
                    "startIndex must be a non-negative integer".into(),
                )
            })?,
    };

    Ok(ChannelTransfer {
        channel,
        start_index,
        samples: samples(buffer, "samples")?,
    })
}

fn samples(value: &Value, field: &str) -> Result<SampleBuffer> {
    let items = value
        .as_array()
        .ok_or_else(|| RelayError::InvalidArgumentType(format!("{field} must be an array")))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64().map(|v| v as f32).ok_or_else(|| {
                RelayError::InvalidArgumentType(format!("{field}[{i}] is not a number"))
            })
        })
        .collect::<Result<Vec<f32>>>()
        .map(SampleBuffer::new)
}

fn object(data: &Value) -> Result<&Map<String, Value>> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    match data {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(EMPTY.get_or_init(Map::new)),
        _ => Err(RelayError::InvalidArgumentType(
            "event data must be an object".into(),
        )),
    }
}

fn find_field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

fn required_field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Result<&'a Value> {
    find_field(fields, names).ok_or_else(|| missing(names))
}

fn missing(names: &[&str]) -> RelayError {
    RelayError::InvalidArgumentType(format!("missing field '{}'", names[0]))
}
