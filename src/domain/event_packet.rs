//! The event packet carried inside every envelope.

use std::fmt;

use rmpv::Value;

use super::payload::{Payload, has_binary};
use super::scope::DEFAULT_NAMESPACE;
use crate::error::EmitterError;

/// Socket.IO packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketType {
    /// Plain event (`2`).
    Event,
    /// Event whose arguments include raw binary (`5`).
    BinaryEvent,
}

impl PacketType {
    /// Returns the numeric wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Event => 2,
            Self::BinaryEvent => 5,
        }
    }

    /// Maps a wire code back to a packet type.
    #[must_use]
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            2 => Some(Self::Event),
            5 => Some(Self::BinaryEvent),
            _ => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => f.write_str("event"),
            Self::BinaryEvent => f.write_str("binary_event"),
        }
    }
}

/// One emitted event: type, name, payload and namespace.
///
/// Built fresh for every emit and consumed by the encoder. On the wire
/// it is the map `{ "type": 2|5, "data": [name, payload], "nsp": ns }`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPacket {
    packet_type: PacketType,
    event_name: String,
    payload: Payload,
    namespace: String,
}

impl EventPacket {
    /// Builds a packet for `event_name` with a single payload value.
    ///
    /// The packet is a binary event if the payload is raw binary.
    #[must_use]
    pub fn new(event_name: impl Into<String>, payload: Payload, namespace: impl Into<String>) -> Self {
        let packet_type = if payload.is_binary() {
            PacketType::BinaryEvent
        } else {
            PacketType::Event
        };
        Self {
            packet_type,
            event_name: event_name.into(),
            payload,
            namespace: namespace.into(),
        }
    }

    /// Builds a packet from the legacy `emit(args...)` call shape.
    ///
    /// `args[0]` is the event name and `args[1]` the payload (nil when
    /// absent). Further arguments are accepted but not carried; they do
    /// still count for binary detection.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] if there is no first
    /// argument or it is not a string.
    pub fn from_args(args: &[Payload], namespace: impl Into<String>) -> Result<Self, EmitterError> {
        let event_name = args
            .first()
            .ok_or_else(|| EmitterError::InvalidArgument("emit requires an event name".into()))?
            .as_str()
            .ok_or_else(|| EmitterError::InvalidArgument("event name must be a string".into()))?
            .to_string();
        let payload = args.get(1).cloned().unwrap_or_default();

        let mut packet = Self::new(event_name, payload, namespace);
        if has_binary(args) {
            packet.packet_type = PacketType::BinaryEvent;
        }
        Ok(packet)
    }

    /// Packet type.
    #[must_use]
    pub const fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    /// Event name.
    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Payload value.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Namespace the event is addressed to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Wire value: `{ type, data: [name, payload], nsp }`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::from("type"), Value::from(self.packet_type.code())),
            (
                Value::from("data"),
                Value::Array(vec![
                    Value::from(self.event_name.as_str()),
                    self.payload.as_value().clone(),
                ]),
            ),
            (Value::from("nsp"), Value::from(self.namespace.as_str())),
        ])
    }

    /// Reads a packet back from its wire value.
    ///
    /// A missing `nsp` decodes as the default namespace.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Decoding`] if the value does not have the
    /// packet shape.
    pub fn from_value(value: &Value) -> Result<Self, EmitterError> {
        let entries = value
            .as_map()
            .ok_or_else(|| EmitterError::Decoding("packet is not a map".into()))?;
        let field = |name: &str| {
            entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(name))
                .map(|(_, v)| v)
        };

        let packet_type = field("type")
            .and_then(Value::as_u64)
            .and_then(PacketType::from_code)
            .ok_or_else(|| EmitterError::Decoding("packet has no valid 'type'".into()))?;

        let data = field("data")
            .and_then(Value::as_array)
            .ok_or_else(|| EmitterError::Decoding("packet has no 'data' array".into()))?;
        let event_name = data
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| EmitterError::Decoding("packet data has no event name".into()))?
            .to_string();
        let payload = data.get(1).cloned().map(Payload::from).unwrap_or_default();

        let namespace = field("nsp")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_NAMESPACE)
            .to_string();

        Ok(Self {
            packet_type,
            event_name,
            payload,
            namespace,
        })
    }
}
