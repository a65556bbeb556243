//! OSC 1.0 message building, validation and datagram encoding.
//!
//! Every message the relay emits is an address path plus an ordered list of
//! 32-bit typed arguments, encoded as:
//! - the address, NUL-terminated and padded to a 4-byte boundary
//! - a type-tag string (`,` followed by `i`/`f` per argument), padded likewise
//! - the arguments, big-endian, 4 bytes each
//!
//! One message per datagram. No bundles, no timetags.

pub mod address;
pub mod codec;
pub mod error;
pub mod message;
pub mod writer;

#[cfg(feature = "async")]
pub mod osc_codec;

pub use codec::{decode_message, encode_message, encoded_len, DEFAULT_MAX_MESSAGE_SIZE};
pub use error::{Result, WireError};
pub use message::{ArgType, TypedValue, WireMessage};
pub use writer::MessageWriter;

#[cfg(feature = "async")]
pub use osc_codec::OscCodec;
