use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WireError};

/// The argument types the protocol allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Int32,
    Float32,
}

impl ArgType {
    /// Parse an OSC type tag. Only `i` and `f` are accepted.
    pub fn from_tag(tag: char) -> Result<Self> {
        match tag {
            'i' => Ok(Self::Int32),
            'f' => Ok(Self::Float32),
            other => Err(WireError::InvalidArgumentType(format!(
                "unsupported type tag '{other}'"
            ))),
        }
    }

    pub fn tag(self) -> char {
        match self {
            Self::Int32 => 'i',
            Self::Float32 => 'f',
        }
    }
}

/// One typed argument.
///
/// Serializes as `{"type": "i", "value": 1}` / `{"type": "f", "value": 0.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TypedValue {
    #[serde(rename = "i")]
    Int32(i32),
    #[serde(rename = "f")]
    Float32(f32),
}

impl TypedValue {
    pub fn arg_type(&self) -> ArgType {
        match self {
            Self::Int32(_) => ArgType::Int32,
            Self::Float32(_) => ArgType::Float32,
        }
    }

    pub fn tag(&self) -> char {
        self.arg_type().tag()
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Int32(v) => Some(v),
            Self::Float32(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float32(v) => Some(v),
            Self::Int32(_) => None,
        }
    }

    /// Build a value of the declared type from client-supplied JSON.
    ///
    /// Int32 accepts booleans and integral numbers within `i32` range.
    /// Float32 accepts any finite number that fits `f32`.
    pub fn from_json(ty: ArgType, value: &Value) -> Result<Self> {
        match ty {
            ArgType::Int32 => match value {
                Value::Bool(b) => Ok(Self::Int32(i32::from(*b))),
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        return i32::try_from(i).map(Self::Int32).map_err(|_| {
                            WireError::InvalidArgumentType(format!("{i} is out of Int32 range"))
                        });
                    }
                    match n.as_f64() {
                        Some(f)
                            if f.fract() == 0.0
                                && f >= f64::from(i32::MIN)
                                && f <= f64::from(i32::MAX) =>
                        {
                            Ok(Self::Int32(f as i32))
                        }
                        _ => Err(WireError::InvalidArgumentType(format!(
                            "{n} is not an Int32"
                        ))),
                    }
                }
                other => Err(WireError::InvalidArgumentType(format!(
                    "expected Int32, got {}",
                    json_kind(other)
                ))),
            },
            ArgType::Float32 => match value {
                Value::Number(n) => {
                    let f = n.as_f64().unwrap_or(f64::NAN) as f32;
                    if f.is_finite() {
                        Ok(Self::Float32(f))
                    } else {
                        Err(WireError::InvalidArgumentType(format!(
                            "{n} is out of Float32 range"
                        )))
                    }
                }
                other => Err(WireError::InvalidArgumentType(format!(
                    "expected Float32, got {}",
                    json_kind(other)
                ))),
            },
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "i:{v}"),
            Self::Float32(v) => write!(f, "f:{v}"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One protocol message: an address path plus ordered typed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    address: String,
    args: Vec<TypedValue>,
}

impl WireMessage {
    /// Build a message, rejecting a blank address.
    pub fn new(address: impl Into<String>, args: Vec<TypedValue>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(WireError::EmptyAddress);
        }
        Ok(Self { address, args })
    }

    /// Build a message from `(type tag, JSON value)` pairs.
    ///
    /// Fails on the first argument whose tag is not `i`/`f` or whose value
    /// does not fit the tag; no partial message is produced.
    pub fn from_tagged<'a, I>(address: impl Into<String>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, &'a Value)>,
    {
        let args = args
            .into_iter()
            .map(|(tag, value)| TypedValue::from_json(ArgType::from_tag(tag)?, value))
            .collect::<Result<Vec<_>>>()?;
        Self::new(address, args)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[TypedValue] {
        &self.args
    }

    pub fn into_args(self) -> Vec<TypedValue> {
        self.args
    }

    /// The OSC type-tag string, including the leading comma.
    pub fn type_tags(&self) -> String {
        std::iter::once(',')
            .chain(self.args.iter().map(TypedValue::tag))
            .collect()
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
