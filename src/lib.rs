//! # socketio-emitter
//!
//! Publish Socket.IO events from any backend process through the Redis
//! adapter, without holding a single client connection.
//!
//! The gateway tier (Socket.IO servers using the Redis adapter) owns the
//! sockets and subscribes to the bus. This crate builds the envelopes
//! those adapters expect and publishes them on the right channels, for
//! both the legacy single-channel protocol and the current
//! namespace/room protocol.
//!
//! ## Architecture
//!
//! ```text
//! Backend code
//!     │
//!     ├── Emitter / EmitRequest (emitter/)
//!     │
//!     ├── EventPacket, Scope, Payload (domain/)
//!     ├── ProtocolEncoder: envelope + channels (protocol/)
//!     ├── MsgPackCodec + ISO-8601 timestamps (codec/)
//!     │
//!     └── Transport: Redis PUBLISH (transport/)
//!             │
//!             └── Gateway instances (external)
//! ```

pub mod codec;
pub mod config;
pub mod domain;
pub mod emitter;
pub mod error;
pub mod protocol;
pub mod transport;
