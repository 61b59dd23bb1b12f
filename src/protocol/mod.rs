//! Protocol layer: versions, channel names and envelopes.
//!
//! This is the compatibility contract with the gateway-side adapter.
//! [`ProtocolEncoder`] turns an [`crate::domain::EventPacket`] and its
//! [`crate::domain::Scope`] into a [`RoutedEnvelope`]: the encoded bytes
//! plus the channels to publish them on.

pub mod channel;
pub mod encoder;
pub mod envelope;
pub mod version;

pub use encoder::{ProtocolEncoder, RoutedEnvelope};
pub use envelope::DecodedEnvelope;
pub use version::ProtocolVersion;
