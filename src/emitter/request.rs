//! Consume-once emit requests.

use rmpv::Value;
use serde::Serialize;

use super::{EmitOutcome, Emitter};
use crate::domain::{EventPacket, Payload, Scope};
use crate::error::EmitterError;
use crate::transport::Transport;

/// A targeted emit under construction.
///
/// Built from an [`Emitter`] with `of`/`to`/`rooms`/`flag` and consumed
/// by one of the `emit` methods. Dropping it without emitting publishes
/// nothing.
#[derive(Debug)]
#[must_use = "an emit request does nothing until `emit` is called"]
pub struct EmitRequest<'a, T> {
    emitter: &'a Emitter<T>,
    scope: Scope,
}

impl<'a, T: Transport> EmitRequest<'a, T> {
    pub(crate) fn new(emitter: &'a Emitter<T>) -> Self {
        Self {
            emitter,
            scope: Scope::new(),
        }
    }

    /// Selects the namespace (`/` unless set).
    pub fn of(mut self, namespace: impl Into<String>) -> Self {
        self.scope.set_namespace(namespace);
        self
    }

    /// Targets `room`, replacing or extending the current rooms according
    /// to the emitter's [`crate::config::RoomSelection`].
    pub fn to(mut self, room: impl Into<String>) -> Self {
        self.scope.select_room(room, self.emitter.room_selection());
        self
    }

    /// Alias of [`EmitRequest::to`].
    pub fn in_room(self, room: impl Into<String>) -> Self {
        self.to(room)
    }

    /// Targets exactly `rooms`, in order, without duplicates.
    pub fn rooms<I, S>(mut self, rooms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope.set_rooms(rooms);
        self
    }

    /// Sets a flag forwarded to the gateway.
    pub fn flag(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.scope.set_flag(name, value);
        self
    }

    /// Sets the `json` flag.
    pub fn json(self) -> Self {
        self.flag("json", true)
    }

    /// Sets the `volatile` flag.
    pub fn volatile(self) -> Self {
        self.flag("volatile", true)
    }

    /// Sets the `broadcast` flag.
    pub fn broadcast(self) -> Self {
        self.flag("broadcast", true)
    }

    /// The scope built so far.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Emits `event` with one payload.
    ///
    /// `Vec<u8>` and `&[u8]` payloads go out as raw binary (a binary
    /// event); chrono timestamps go out in the ISO-8601 wire form.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Transport`] for the first failing publish
    /// (or [`EmitterError::Encoding`] if the envelope cannot be encoded);
    /// publishes before it are not undone, later ones are not attempted.
    pub fn emit(self, event: &str, payload: impl Into<Payload>) -> Result<EmitOutcome, EmitterError> {
        let packet = EventPacket::new(event, payload.into(), self.scope.namespace());
        self.emitter.dispatch(&packet, &self.scope)
    }

    /// Async variant of [`EmitRequest::emit`]. Room publishes run one at
    /// a time in room order.
    ///
    /// # Errors
    ///
    /// Same as [`EmitRequest::emit`].
    pub async fn emit_async(
        self,
        event: &str,
        payload: impl Into<Payload>,
    ) -> Result<EmitOutcome, EmitterError> {
        let packet = EventPacket::new(event, payload.into(), self.scope.namespace());
        self.emitter.dispatch_async(&packet, &self.scope).await
    }

    /// Emits `event` with any serializable payload.
    ///
    /// chrono fields must be tagged with
    /// [`crate::codec::timestamp::iso8601`] to get the wire timestamp
    /// form; see [`Payload::from_serialize`].
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Encoding`] if the payload cannot be
    /// converted, otherwise as [`EmitRequest::emit`].
    pub fn emit_serialize<P: Serialize + ?Sized>(
        self,
        event: &str,
        payload: &P,
    ) -> Result<EmitOutcome, EmitterError> {
        let payload = convert(event, payload)?;
        self.emit(event, payload)
    }

    /// Async variant of [`EmitRequest::emit_serialize`].
    ///
    /// # Errors
    ///
    /// Same as [`EmitRequest::emit_serialize`].
    pub async fn emit_serialize_async<P: Serialize + ?Sized>(
        self,
        event: &str,
        payload: &P,
    ) -> Result<EmitOutcome, EmitterError> {
        let payload = convert(event, payload)?;
        self.emit_async(event, payload).await
    }

    /// Emits in the legacy `emit(args...)` shape.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] if `args` does not start
    /// with a string, otherwise as [`EmitRequest::emit`].
    pub fn emit_args(self, args: &[Payload]) -> Result<EmitOutcome, EmitterError> {
        let packet = EventPacket::from_args(args, self.scope.namespace())?;
        self.emitter.dispatch(&packet, &self.scope)
    }

    /// Async variant of [`EmitRequest::emit_args`].
    ///
    /// # Errors
    ///
    /// Same as [`EmitRequest::emit_args`].
    pub async fn emit_args_async(self, args: &[Payload]) -> Result<EmitOutcome, EmitterError> {
        let packet = EventPacket::from_args(args, self.scope.namespace())?;
        self.emitter.dispatch_async(&packet, &self.scope).await
    }
}

fn convert<P: Serialize + ?Sized>(event: &str, payload: &P) -> Result<Payload, EmitterError> {
    Payload::from_serialize(payload).inspect_err(|e| {
        tracing::warn!(event, error = %e, "payload conversion failed");
    })
}
