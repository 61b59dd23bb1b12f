//! Emitter: the user-facing entry point.
//!
//! [`Emitter`] owns the protocol encoder and a transport. Targeting an
//! emit starts an [`EmitRequest`] that is consumed by `emit`, so rooms
//! and flags can never leak from one emit into the next:
//!
//! ```ignore
//! let emitter = Emitter::connect(&EmitterConfig::new("localhost", 6379))?;
//! emitter.of("/chat").to("lobby").volatile().emit("msg", "hi")?;
//! emitter.emit("broadcast event", json!({ "hello": "world" }))?;
//! emitter.emit_serialize("order", &order)?;
//! ```

pub mod request;

use std::sync::Arc;

use serde::Serialize;

use crate::codec::Codec;
use crate::config::{EmitterConfig, RoomSelection};
use crate::domain::{EventPacket, PacketType, Payload, Scope};
use crate::error::EmitterError;
use crate::protocol::ProtocolEncoder;
use crate::transport::{RedisTransport, Transport};

pub use request::EmitRequest;

/// What a completed emit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOutcome {
    /// Packet type that was sent.
    pub packet_type: PacketType,
    /// Channels published on, in order.
    pub channels: Vec<String>,
    /// Total subscribers reported by the bus across all channels.
    pub receivers: usize,
}

/// Publishes Socket.IO events on the bus.
///
/// Stateless between emits: every targeting call returns a fresh
/// [`EmitRequest`]. Concurrent emits from several tasks are safe as long
/// as the transport is.
#[derive(Debug)]
pub struct Emitter<T> {
    encoder: ProtocolEncoder,
    transport: T,
    room_selection: RoomSelection,
}

impl Emitter<RedisTransport> {
    /// Creates an emitter publishing to the Redis server in `config.bus`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Configuration`] if the bus host or port is
    /// missing.
    pub fn connect(config: &EmitterConfig) -> Result<Self, EmitterError> {
        let transport = RedisTransport::connect(&config.bus)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> Emitter<T> {
    /// Creates an emitter over an existing transport.
    #[must_use]
    pub fn new(config: &EmitterConfig, transport: T) -> Self {
        Self {
            encoder: ProtocolEncoder::new(config),
            transport,
            room_selection: config.room_selection,
        }
    }

    /// Creates an emitter with a custom codec.
    #[must_use]
    pub fn with_codec(config: &EmitterConfig, transport: T, codec: Arc<dyn Codec>) -> Self {
        Self {
            encoder: ProtocolEncoder::with_codec(config, codec),
            transport,
            room_selection: config.room_selection,
        }
    }

    /// Starts an emit on the default scope.
    pub fn request(&self) -> EmitRequest<'_, T> {
        EmitRequest::new(self)
    }

    /// Starts an emit to `namespace`.
    pub fn of(&self, namespace: impl Into<String>) -> EmitRequest<'_, T> {
        self.request().of(namespace)
    }

    /// Starts an emit to `room`.
    pub fn to(&self, room: impl Into<String>) -> EmitRequest<'_, T> {
        self.request().to(room)
    }

    /// Alias of [`Emitter::to`].
    pub fn in_room(&self, room: impl Into<String>) -> EmitRequest<'_, T> {
        self.request().in_room(room)
    }

    /// Starts an emit to several rooms.
    pub fn rooms<I, S>(&self, rooms: I) -> EmitRequest<'_, T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request().rooms(rooms)
    }

    /// Starts an emit carrying a flag.
    pub fn flag(&self, name: impl Into<String>, value: impl Into<rmpv::Value>) -> EmitRequest<'_, T> {
        self.request().flag(name, value)
    }

    /// Emits `event` with one payload to every socket of `/`.
    ///
    /// Byte buffers (`Vec<u8>`, `&[u8]`) make a binary event. chrono
    /// timestamps are sent in the ISO-8601 wire form. Use
    /// [`Emitter::emit_serialize`] for structs and other `Serialize`
    /// values.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Transport`] if a publish fails.
    pub fn emit(&self, event: &str, payload: impl Into<Payload>) -> Result<EmitOutcome, EmitterError> {
        self.request().emit(event, payload)
    }

    /// Async variant of [`Emitter::emit`].
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::emit`].
    pub async fn emit_async(
        &self,
        event: &str,
        payload: impl Into<Payload>,
    ) -> Result<EmitOutcome, EmitterError> {
        self.request().emit_async(event, payload).await
    }

    /// Emits `event` with any serializable payload to every socket of `/`.
    ///
    /// chrono fields inside `payload` keep chrono's serde form unless
    /// tagged with `#[serde(with = "socketio_emitter::codec::timestamp::iso8601")]`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Encoding`] if the payload cannot be
    /// converted, or [`EmitterError::Transport`] if a publish fails.
    pub fn emit_serialize<P: Serialize + ?Sized>(
        &self,
        event: &str,
        payload: &P,
    ) -> Result<EmitOutcome, EmitterError> {
        self.request().emit_serialize(event, payload)
    }

    /// Async variant of [`Emitter::emit_serialize`].
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::emit_serialize`].
    pub async fn emit_serialize_async<P: Serialize + ?Sized>(
        &self,
        event: &str,
        payload: &P,
    ) -> Result<EmitOutcome, EmitterError> {
        self.request().emit_serialize_async(event, payload).await
    }

    /// Emits in the legacy `emit(args...)` shape: event name first.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] if `args` does not start
    /// with a string, otherwise as [`Emitter::emit`].
    pub fn emit_args(&self, args: &[Payload]) -> Result<EmitOutcome, EmitterError> {
        self.request().emit_args(args)
    }

    /// Async variant of [`Emitter::emit_args`].
    ///
    /// # Errors
    ///
    /// Same as [`Emitter::emit_args`].
    pub async fn emit_args_async(&self, args: &[Payload]) -> Result<EmitOutcome, EmitterError> {
        self.request().emit_args_async(args).await
    }

    /// The protocol encoder.
    #[must_use]
    pub const fn encoder(&self) -> &ProtocolEncoder {
        &self.encoder
    }

    /// The transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// The configured room selection rule.
    #[must_use]
    pub const fn room_selection(&self) -> RoomSelection {
        self.room_selection
    }

    /// Encodes and publishes, blocking on each publish in channel order.
    fn dispatch(&self, packet: &EventPacket, scope: &Scope) -> Result<EmitOutcome, EmitterError> {
        let routed = self.encoder.route(packet, scope).inspect_err(|e| {
            tracing::warn!(event = packet.event_name(), error = %e, "envelope encoding failed");
        })?;

        let mut receivers = 0_usize;
        for channel in &routed.channels {
            let n = self
                .transport
                .publish(channel, &routed.bytes)
                .inspect_err(|e| tracing::warn!(%channel, error = %e, "publish failed"))?;
            receivers = receivers.saturating_add(n);
        }

        tracing::debug!(
            event = packet.event_name(),
            nsp = packet.namespace(),
            channels = routed.channels.len(),
            receivers,
            "event emitted"
        );
        Ok(EmitOutcome {
            packet_type: packet.packet_type(),
            channels: routed.channels,
            receivers,
        })
    }

    /// Encodes and publishes, awaiting each publish before the next.
    async fn dispatch_async(
        &self,
        packet: &EventPacket,
        scope: &Scope,
    ) -> Result<EmitOutcome, EmitterError> {
        let routed = self.encoder.route(packet, scope).inspect_err(|e| {
            tracing::warn!(event = packet.event_name(), error = %e, "envelope encoding failed");
        })?;

        let mut receivers = 0_usize;
        for channel in &routed.channels {
            let n = self
                .transport
                .publish_async(channel, &routed.bytes)
                .await
                .inspect_err(|e| tracing::warn!(%channel, error = %e, "publish failed"))?;
            receivers = receivers.saturating_add(n);
        }

        tracing::debug!(
            event = packet.event_name(),
            nsp = packet.namespace(),
            channels = routed.channels.len(),
            receivers,
            "event emitted"
        );
        Ok(EmitOutcome {
            packet_type: packet.packet_type(),
            channels: routed.channels,
            receivers,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolVersion;
    use crate::transport::MemoryTransport;

    fn emitter(version: ProtocolVersion) -> Emitter<Arc<MemoryTransport>> {
        let config = EmitterConfig::default()
            .with_protocol_version(version)
            .with_uid("uid-test");
        Emitter::new(&config, Arc::new(MemoryTransport::new()))
    }

    #[test]
    fn emit_without_scope_targets_root_namespace() {
        let emitter = emitter(ProtocolVersion::Current);
        let Ok(outcome) = emitter.emit("news", "hello") else {
            panic!("emit failed");
        };
        assert_eq!(outcome.channels, vec!["socket.io#/#"]);
        assert_eq!(emitter.transport().channels(), vec!["socket.io#/#"]);
    }

    #[test]
    fn binary_payload_emits_binary_event() {
        let emitter = emitter(ProtocolVersion::Current);
        let Ok(outcome) = emitter.emit("e", Payload::binary(vec![1_u8, 2, 3])) else {
            panic!("emit failed");
        };
        assert_eq!(outcome.packet_type, PacketType::BinaryEvent);

        let Ok(text) = emitter.emit("e", "text") else {
            panic!("emit failed");
        };
        assert_eq!(text.packet_type, PacketType::Event);
    }

    #[test]
    fn byte_buffers_emit_binary_event() {
        let emitter = emitter(ProtocolVersion::Current);
        let raw = vec![1_u8, 2, 3];
        let Ok(owned) = emitter.emit("e", &raw) else {
            panic!("emit failed");
        };
        assert_eq!(owned.packet_type, PacketType::BinaryEvent);
        let Ok(sliced) = emitter.emit("e", raw.as_slice()) else {
            panic!("emit failed");
        };
        assert_eq!(sliced.packet_type, PacketType::BinaryEvent);

        let messages = emitter.transport().published();
        let Some(first) = messages.first() else {
            panic!("nothing published");
        };
        let Ok(envelope) = emitter.encoder().decode(&first.payload) else {
            panic!("decode failed");
        };
        assert_eq!(envelope.packet.payload().as_value(), &rmpv::Value::Binary(raw));
    }

    #[test]
    fn serialized_byte_vector_stays_an_array() {
        let emitter = emitter(ProtocolVersion::Current);
        let Ok(outcome) = emitter.emit_serialize("e", &vec![1_u8, 2, 3]) else {
            panic!("emit failed");
        };
        assert_eq!(outcome.packet_type, PacketType::Event);
    }

    #[tokio::test]
    async fn async_fan_out_stops_at_failing_room() {
        let transport = Arc::new(MemoryTransport::failing_at(2));
        let config = EmitterConfig::default();
        let emitter = Emitter::new(&config, Arc::clone(&transport));

        let Err(err) = emitter.rooms(["r1", "r2", "r3"]).emit_async("e", "x").await else {
            panic!("expected a transport error");
        };
        assert!(err.to_string().contains("socket.io#/#r2#"));
        assert_eq!(transport.attempts(), 2);
        assert_eq!(transport.channels(), vec!["socket.io#/#r1#"]);
    }

    #[test]
    fn receivers_are_summed_across_rooms() {
        let config = EmitterConfig::default();
        let emitter = Emitter::new(&config, MemoryTransport::new().with_receivers(2));
        let Ok(outcome) = emitter.rooms(["a", "b", "c"]).emit("e", 1_i64) else {
            panic!("emit failed");
        };
        assert_eq!(outcome.receivers, 6);
    }

    #[test]
    fn emit_args_rejects_empty_call_without_publishing() {
        let emitter = emitter(ProtocolVersion::Legacy);
        assert!(emitter.emit_args(&[]).is_err());
        assert_eq!(emitter.transport().attempts(), 0);
    }

    #[tokio::test]
    async fn emit_args_async_uses_legacy_channel() {
        let emitter = emitter(ProtocolVersion::Legacy);
        let args = [Payload::from("broadcast event"), Payload::from("Hello from emitter")];
        let Ok(outcome) = emitter.emit_args_async(&args).await else {
            panic!("emit failed");
        };
        assert_eq!(outcome.channels, vec!["socket.io#emitter"]);
    }
}
