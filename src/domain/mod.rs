//! Domain layer: the packet model.
//!
//! This module contains the data shapes an emit call is turned into:
//! the [`Scope`] an event targets, the [`Payload`] it carries and the
//! [`EventPacket`] handed to the protocol encoder.

pub mod event_packet;
pub mod payload;
pub mod scope;

pub use event_packet::{EventPacket, PacketType};
pub use payload::{Payload, has_binary};
pub use scope::{DEFAULT_NAMESPACE, Scope};
