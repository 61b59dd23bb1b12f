//! Event payload values.
//!
//! A [`Payload`] is the MessagePack value carried in a packet's `data`
//! array next to the event name. Byte buffers, chrono timestamps, JSON
//! values and scalars convert with `From`, so they land on the wire in
//! the form the gateway expects: `Vec<u8>`/`&[u8]` as raw binary and
//! timestamps as seven-digit ISO-8601 strings. Any other
//! `serde::Serialize` value goes through [`Payload::from_serialize`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rmpv::Value;
use serde::{Serialize, Serializer};

use crate::codec::IsoTimestamp;
use crate::codec::timestamp;
use crate::error::EmitterError;

/// A single event argument, held as a MessagePack value tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(Value);

impl Payload {
    /// The nil payload.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Value::Nil)
    }

    /// Converts any serializable value.
    ///
    /// Byte slices serialized through `serialize_bytes` become raw binary;
    /// a `Vec<u8>` serializes as an array of integers and does not. Use
    /// `Payload::from(bytes)` for a top-level buffer.
    ///
    /// chrono fields inside `value` use chrono's own serde form (nine or
    /// zero fractional digits), which the gateway does not expect. Tag
    /// them with `#[serde(with = "socketio_emitter::codec::timestamp::iso8601")]`
    /// (or `iso8601::option`) to get the seven-digit wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Encoding`] if the value cannot be
    /// represented.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, EmitterError> {
        Ok(Self(rmpv::ext::to_value(value)?))
    }

    /// Raw binary data. Marks the packet as a binary event.
    #[must_use]
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Value::Binary(bytes.into()))
    }

    /// A timestamp in its ISO-8601 wire form.
    #[must_use]
    pub fn timestamp<T: IsoTimestamp + ?Sized>(ts: &T) -> Self {
        Self(timestamp::to_value(ts))
    }

    /// A nullable timestamp; `None` is nil.
    #[must_use]
    pub fn optional_timestamp<T: IsoTimestamp>(ts: Option<&T>) -> Self {
        Self(timestamp::optional_to_value(ts))
    }

    /// Returns `true` if the value itself is raw binary.
    ///
    /// Shallow: binary nested inside arrays or maps is not detected.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self.0, Value::Binary(_))
    }

    /// Returns the string content if the payload is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Borrows the underlying value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the underlying value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Returns `true` if any top-level argument is raw binary.
#[must_use]
pub fn has_binary(args: &[Payload]) -> bool {
    args.iter().any(Payload::is_binary)
}

impl Default for Payload {
    fn default() -> Self {
        Self::nil()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self(Value::from(s))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self(Value::from(s))
    }
}

impl From<&String> for Payload {
    fn from(s: &String) -> Self {
        Self(Value::from(s.as_str()))
    }
}

impl From<&Payload> for Payload {
    fn from(payload: &Payload) -> Self {
        payload.clone()
    }
}

impl From<i32> for Payload {
    fn from(n: i32) -> Self {
        Self(Value::from(n))
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Self(Value::from(n))
    }
}

impl From<u64> for Payload {
    fn from(n: u64) -> Self {
        Self(Value::from(n))
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Self(Value::from(n))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Self(Value::from(b))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::binary(bytes)
    }
}

impl From<&Vec<u8>> for Payload {
    fn from(bytes: &Vec<u8>) -> Self {
        Self::binary(bytes.as_slice())
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::binary(bytes)
    }
}

impl From<DateTime<Utc>> for Payload {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::timestamp(&ts)
    }
}

impl From<Option<DateTime<Utc>>> for Payload {
    fn from(ts: Option<DateTime<Utc>>) -> Self {
        Self::optional_timestamp(ts.as_ref())
    }
}

impl From<DateTime<FixedOffset>> for Payload {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self::timestamp(&ts)
    }
}

impl From<NaiveDateTime> for Payload {
    fn from(ts: NaiveDateTime) -> Self {
        Self::timestamp(&ts)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(json: serde_json::Value) -> Self {
        Self(json_to_value(&json))
    }
}

impl From<&serde_json::Value> for Payload {
    fn from(json: &serde_json::Value) -> Self {
        Self(json_to_value(json))
    }
}

fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::from(*b),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(Value::from)
            .or_else(|| n.as_i64().map(Value::from))
            .or_else(|| n.as_f64().map(Value::from))
            .unwrap_or(Value::Nil),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (Value::from(k.as_str()), json_to_value(v)))
                .collect(),
        ),
    }
}
