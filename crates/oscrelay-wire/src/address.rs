//! The closed set of OSC addresses the downstream peer understands.
//!
//! Addresses are case-sensitive literals and versioned with the peer. There
//! is no runtime registration.

/// Continuous sensor value, one Float32.
pub const SENSOR: &str = "/osc_from_js";

/// Trajectory loop on/off, one Int32.
pub const IS_LOOPING: &str = "/osc_from_js_is_looping";

/// Left channel sample chunk: Int32 start index, then Float32 samples.
pub const LEFT_CHANNEL_DATA: &str = "/osc_from_js_left_channel_data";

/// Right channel sample chunk: Int32 start index, then Float32 samples.
pub const RIGHT_CHANNEL_DATA: &str = "/osc_from_js_right_channel_data";

/// End of a sample upload, one Int32.
pub const AUDIO_TRANSMISSION_DONE: &str = "/osc_from_js_audio_transmission_done";

/// Discard the peer's recording buffer. No arguments.
pub const CLEAR_RECORDING_BUFFER: &str = "/osc_from_js_clear_recording_buffer";

/// Start playback. No arguments.
pub const PLAY: &str = "/osc_from_js_play";

/// Agent feedback rating, one Int32.
pub const AGENT_FEEDBACK: &str = "/osc_from_js_agent_feedback";

/// Agent zone feedback rating, one Int32.
pub const AGENT_ZONE_FEEDBACK: &str = "/osc_from_js_agent_zone_feedback";

/// Agent paused (1) or running (0), one Int32.
pub const PAUSE_AGENT: &str = "/osc_from_js_pause_agent";

/// Ask the peer to capture audio natively. No arguments.
pub const RECORD_IN_HOST: &str = "/osc_from_js_record_in_JUCE";

/// Trigger agent exploration. No arguments.
pub const EXPLORE: &str = "/osc_from_js_explore";

/// Every address in the protocol.
pub const ALL: [&str; 12] = [
    SENSOR,
    IS_LOOPING,
    LEFT_CHANNEL_DATA,
    RIGHT_CHANNEL_DATA,
    AUDIO_TRANSMISSION_DONE,
    CLEAR_RECORDING_BUFFER,
    PLAY,
    AGENT_FEEDBACK,
    AGENT_ZONE_FEEDBACK,
    PAUSE_AGENT,
    RECORD_IN_HOST,
    EXPLORE,
];

/// Returns true if `address` belongs to the protocol.
pub fn is_known(address: &str) -> bool {
    ALL.contains(&address)
}

/// Returns true if `address` carries chunked sample data.
pub fn is_channel_data(address: &str) -> bool {
    address == LEFT_CHANNEL_DATA || address == RIGHT_CHANNEL_DATA
}

/// Returns a short human-readable label for an address.
pub fn address_label(address: &str) -> &'static str {
    match address {
        SENSOR => "sensor",
        IS_LOOPING => "looping",
        LEFT_CHANNEL_DATA => "left-data",
        RIGHT_CHANNEL_DATA => "right-data",
        AUDIO_TRANSMISSION_DONE => "audio-done",
        CLEAR_RECORDING_BUFFER => "clear-buffer",
        PLAY => "play",
        AGENT_FEEDBACK => "agent-feedback",
        AGENT_ZONE_FEEDBACK => "zone-feedback",
        PAUSE_AGENT => "pause-agent",
        RECORD_IN_HOST => "record-in-host",
        EXPLORE => "explore",
        _ => "UNKNOWN",
    }
}
