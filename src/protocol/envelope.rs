//! Envelope construction and parsing.
//!
//! ```text
//! legacy:  [ packet, { rooms, flags } ]
//! current: [ uid, packet, { rooms, flags } ]
//! ```
//!
//! `rooms` and `flags` are the empty string when empty.

use rmpv::Value;

use super::ProtocolVersion;
use crate::domain::{EventPacket, Scope};
use crate::error::EmitterError;

/// Builds the envelope value for one emit.
#[must_use]
pub fn build(version: ProtocolVersion, uid: &str, packet: &EventPacket, scope: &Scope) -> Value {
    let mut parts = Vec::with_capacity(3);
    if version.carries_uid() {
        parts.push(Value::from(uid));
    }
    parts.push(packet.to_value());
    parts.push(scope.options_value());
    Value::Array(parts)
}

/// An envelope read back from the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnvelope {
    /// Emitter uid; `None` for legacy envelopes.
    pub uid: Option<String>,
    /// The event packet.
    pub packet: EventPacket,
    /// Targeted rooms; empty when the envelope carried `""`.
    pub rooms: Vec<String>,
    /// Forwarded flags; empty when the envelope carried `""`.
    pub flags: Vec<(String, Value)>,
}

impl DecodedEnvelope {
    /// Parses an envelope value of the given protocol generation.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Decoding`] if the value does not have the
    /// envelope shape of `version`.
    pub fn from_value(version: ProtocolVersion, value: &Value) -> Result<Self, EmitterError> {
        let parts = value
            .as_array()
            .ok_or_else(|| EmitterError::Decoding("envelope is not an array".into()))?;

        let (uid, packet, options) = match (version.carries_uid(), parts.as_slice()) {
            (false, [packet, options]) => (None, packet, options),
            (true, [uid, packet, options]) => {
                let uid = uid
                    .as_str()
                    .ok_or_else(|| EmitterError::Decoding("envelope uid is not a string".into()))?;
                (Some(uid.to_string()), packet, options)
            }
            (_, parts) => {
                return Err(EmitterError::Decoding(format!(
                    "{version} envelope has {} elements",
                    parts.len()
                )));
            }
        };

        let packet = EventPacket::from_value(packet)?;
        let (rooms, flags) = parse_options(options)?;
        Ok(Self {
            uid,
            packet,
            rooms,
            flags,
        })
    }
}

type Options = (Vec<String>, Vec<(String, Value)>);

fn parse_options(options: &Value) -> Result<Options, EmitterError> {
    let entries = options
        .as_map()
        .ok_or_else(|| EmitterError::Decoding("envelope options are not a map".into()))?;
    let field = |name: &str| {
        entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(name))
            .map(|(_, v)| v)
    };

    let rooms = match field("rooms") {
        None | Some(Value::Nil) => Vec::new(),
        Some(Value::String(s)) if s.as_str() == Some("") => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|room| {
                room.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| EmitterError::Decoding("room name is not a string".into()))
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(EmitterError::Decoding(format!("unexpected rooms value {other}")));
        }
    };

    let flags = match field("flags") {
        None | Some(Value::Nil) => Vec::new(),
        Some(Value::String(s)) if s.as_str() == Some("") => Vec::new(),
        Some(Value::Map(items)) => items
            .iter()
            .map(|(k, v)| {
                k.as_str()
                    .map(|k| (k.to_string(), v.clone()))
                    .ok_or_else(|| EmitterError::Decoding("flag name is not a string".into()))
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(EmitterError::Decoding(format!("unexpected flags value {other}")));
        }
    };

    Ok((rooms, flags))
}
