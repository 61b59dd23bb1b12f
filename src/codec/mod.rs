//! Binary codec used to build envelopes.
//!
//! The encoder never touches MessagePack bytes directly: it builds an
//! [`rmpv::Value`] tree and hands it to a [`Codec`]. The default
//! [`MsgPackCodec`] delegates the byte-level work to `rmpv`.
//!
//! Timestamps are the one type with a custom handler: see [`timestamp`]
//! for the ISO-8601 string form the gateway expects.

pub mod msgpack;
pub mod timestamp;

use std::fmt;

use rmpv::Value;

use crate::error::EmitterError;

pub use msgpack::MsgPackCodec;
pub use timestamp::IsoTimestamp;

/// Encodes value trees to bytes and back.
///
/// Implementations are held behind an `Arc<dyn Codec>` by the protocol
/// encoder, so they must be thread-safe and object-safe.
pub trait Codec: fmt::Debug + Send + Sync {
    /// Encodes a value tree into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Encoding`] if the value cannot be written.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EmitterError>;

    /// Decodes bytes into a value tree.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Decoding`] on malformed or truncated input.
    fn decode(&self, bytes: &[u8]) -> Result<Value, EmitterError>;
}
