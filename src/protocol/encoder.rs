//! Protocol encoder: packet + scope → envelope bytes + channels.

use std::sync::Arc;

use super::envelope::{self, DecodedEnvelope};
use super::{ProtocolVersion, channel};
use crate::codec::{Codec, MsgPackCodec};
use crate::config::EmitterConfig;
use crate::domain::{EventPacket, Scope};
use crate::error::EmitterError;

/// Encoded envelope and the channels to publish it on.
///
/// Every channel receives the same bytes; under the current protocol the
/// room distinction lives only in the channel name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEnvelope {
    /// Encoded envelope.
    pub bytes: Vec<u8>,
    /// Target channels in publish order.
    pub channels: Vec<String>,
}

/// Stateless encoder/router for one emitter configuration.
///
/// Holds the key prefix, protocol version and uid fixed at construction
/// together with the [`Codec`] used for every envelope.
#[derive(Debug, Clone)]
pub struct ProtocolEncoder {
    prefix: String,
    version: ProtocolVersion,
    uid: String,
    codec: Arc<dyn Codec>,
}

impl ProtocolEncoder {
    /// Creates an encoder with the default MessagePack codec.
    #[must_use]
    pub fn new(config: &EmitterConfig) -> Self {
        Self::with_codec(config, Arc::new(MsgPackCodec::new()))
    }

    /// Creates an encoder with a custom codec.
    #[must_use]
    pub fn with_codec(config: &EmitterConfig, codec: Arc<dyn Codec>) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            version: config.protocol_version,
            uid: config.uid.clone(),
            codec,
        }
    }

    /// Encodes `packet` for `scope` and lists its target channels.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Encoding`] if the codec rejects the
    /// envelope.
    pub fn route(&self, packet: &EventPacket, scope: &Scope) -> Result<RoutedEnvelope, EmitterError> {
        let value = envelope::build(self.version, &self.uid, packet, scope);
        let bytes = self.codec.encode(&value)?;
        let channels = channel::channels_for(self.version, &self.prefix, scope);
        Ok(RoutedEnvelope { bytes, channels })
    }

    /// Decodes an envelope published by an emitter of the same version.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Decoding`] on malformed bytes or shape.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedEnvelope, EmitterError> {
        let value = self.codec.decode(bytes)?;
        DecodedEnvelope::from_value(self.version, &value)
    }

    /// Pattern matching every channel this encoder routes to.
    #[must_use]
    pub fn subscription_pattern(&self) -> String {
        channel::subscription_pattern(self.version, &self.prefix)
    }

    /// Channel key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Protocol generation.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Emitter uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use rmpv::Value;

    use super::*;
    use crate::domain::Payload;

    /// Codec that refuses everything.
    #[derive(Debug)]
    struct RejectingCodec;

    impl Codec for RejectingCodec {
        fn encode(&self, _value: &rmpv::Value) -> Result<Vec<u8>, EmitterError> {
            Err(EmitterError::Encoding("unsupported value".into()))
        }

        fn decode(&self, _bytes: &[u8]) -> Result<rmpv::Value, EmitterError> {
            Err(EmitterError::Decoding("unsupported".into()))
        }
    }

    fn config(version: ProtocolVersion) -> EmitterConfig {
        EmitterConfig::default()
            .with_protocol_version(version)
            .with_uid("uid-test")
    }

    #[test]
    fn chat_scenario() {
        let encoder = ProtocolEncoder::new(&config(ProtocolVersion::Current));
        let mut scope = Scope::new();
        scope.set_namespace("/chat");
        let packet = EventPacket::new("msg", Payload::from("hi"), scope.namespace());

        let Ok(routed) = encoder.route(&packet, &scope) else {
            panic!("route failed");
        };
        assert_eq!(routed.channels, vec!["socket.io#/chat#"]);

        let Ok(value) = MsgPackCodec::new().decode(&routed.bytes) else {
            panic!("decode failed");
        };
        let expected = Value::Array(vec![
            Value::from("uid-test"),
            Value::Map(vec![
                (Value::from("type"), Value::from(2)),
                (
                    Value::from("data"),
                    Value::Array(vec![Value::from("msg"), Value::from("hi")]),
                ),
                (Value::from("nsp"), Value::from("/chat")),
            ]),
            Value::Map(vec![
                (Value::from("rooms"), Value::from("")),
                (Value::from("flags"), Value::from("")),
            ]),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn legacy_routes_to_emitter_channel() {
        let encoder = ProtocolEncoder::new(&config(ProtocolVersion::Legacy));
        let mut scope = Scope::new();
        scope.set_rooms(["a", "b"]);
        let packet = EventPacket::new("e", Payload::from(1_i64), "/");

        let Ok(routed) = encoder.route(&packet, &scope) else {
            panic!("route failed");
        };
        assert_eq!(routed.channels, vec!["socket.io#emitter"]);

        let Ok(decoded) = encoder.decode(&routed.bytes) else {
            panic!("decode failed");
        };
        assert_eq!(decoded.rooms, vec!["a", "b"]);
        assert!(decoded.uid.is_none());
    }

    #[test]
    fn codec_failure_is_encoding_error() {
        let encoder =
            ProtocolEncoder::with_codec(&config(ProtocolVersion::Current), Arc::new(RejectingCodec));
        let packet = EventPacket::new("e", Payload::nil(), "/");
        let Err(err) = encoder.route(&packet, &Scope::new()) else {
            panic!("expected encoding error");
        };
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn accessors() {
        let encoder = ProtocolEncoder::new(&config(ProtocolVersion::Current).with_key_prefix("app"));
        assert_eq!(encoder.prefix(), "app");
        assert_eq!(encoder.uid(), "uid-test");
        assert_eq!(encoder.version(), ProtocolVersion::Current);
        assert_eq!(encoder.subscription_pattern(), "app#*");
    }
}
