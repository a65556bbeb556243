use bytes::{BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::message::{ArgType, TypedValue, WireMessage};

/// Largest payload a single IPv4 UDP datagram can carry.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 65_507;

const ALIGN: usize = 4;

fn padded(len: usize) -> usize {
    (len + ALIGN - 1) & !(ALIGN - 1)
}

/// Size of a NUL-terminated, 4-byte aligned OSC string.
fn osc_string_len(s: &str) -> usize {
    padded(s.len() + 1)
}

/// Exact number of bytes `encode_message` writes for `msg`.
pub fn encoded_len(msg: &WireMessage) -> usize {
    let tags = padded(msg.args().len() + 2);
    osc_string_len(msg.address()) + tags + ALIGN * msg.args().len()
}

/// Encode a message into the OSC 1.0 wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────────────┬──────────────────────┬──────────────────────┐
/// │ Address             │ Type tags            │ Arguments            │
/// │ "/path\0" pad to 4  │ ",if\0" pad to 4     │ 4B big-endian each   │
/// └─────────────────────┴──────────────────────┴──────────────────────┘
/// ```
pub fn encode_message(msg: &WireMessage, max_size: usize, dst: &mut BytesMut) -> Result<()> {
    let size = encoded_len(msg);
    if size > max_size {
        return Err(WireError::PayloadTooLarge {
            size,
            max: max_size,
        });
    }

    dst.reserve(size);
    put_osc_string(dst, msg.address());
    put_osc_string(dst, &msg.type_tags());
    for arg in msg.args() {
        match *arg {
            TypedValue::Int32(v) => dst.put_i32(v),
            TypedValue::Float32(v) => dst.put_f32(v),
        }
    }
    Ok(())
}

fn put_osc_string(dst: &mut BytesMut, s: &str) {
    dst.put_slice(s.as_bytes());
    let pad = osc_string_len(s) - s.len();
    dst.put_bytes(0, pad);
}

/// Decode one message occupying the whole of `src`.
pub fn decode_message(src: &[u8]) -> Result<WireMessage> {
    let (address, mut offset) = read_osc_string(src, 0)?;

    if offset >= src.len() {
        return Err(WireError::MissingTypeTags);
    }
    let (tags, next) = read_osc_string(src, offset)?;
    let tags = tags.strip_prefix(',').ok_or(WireError::MissingTypeTags)?;
    offset = next;

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let ty = ArgType::from_tag(tag)?;
        let raw = read_word(src, offset)?;
        offset += ALIGN;
        args.push(match ty {
            ArgType::Int32 => TypedValue::Int32(i32::from_be_bytes(raw)),
            ArgType::Float32 => TypedValue::Float32(f32::from_be_bytes(raw)),
        });
    }

    if offset != src.len() {
        return Err(WireError::TrailingBytes(src.len() - offset));
    }

    WireMessage::new(address, args)
}

fn read_osc_string(src: &[u8], offset: usize) -> Result<(&str, usize)> {
    let rest = src.get(offset..).unwrap_or_default();
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(WireError::UnterminatedString(offset))?;
    let s = std::str::from_utf8(&rest[..nul]).map_err(|_| WireError::InvalidUtf8)?;
    let end = offset + padded(nul + 1);
    if end > src.len() {
        return Err(WireError::Truncated {
            offset,
            needed: end - offset,
        });
    }
    Ok((s, end))
}

fn read_word(src: &[u8], offset: usize) -> Result<[u8; 4]> {
    src.get(offset..offset + ALIGN)
        .and_then(|w| w.try_into().ok())
        .ok_or(WireError::Truncated {
            offset,
            needed: ALIGN,
        })
}
