//! Protocol generations understood by the gateway adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmitterError;

/// Envelope shape and channel scheme spoken on the bus.
///
/// | Version   | Envelope                   | Channels                            |
/// |-----------|----------------------------|-------------------------------------|
/// | `Legacy`  | `[packet, opts]`           | `prefix#emitter`                    |
/// | `Current` | `[uid, packet, opts]`      | `prefix#nsp#` or `prefix#nsp#room#` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVersion {
    /// Single-channel generation (Socket.IO 0.9.x adapters).
    Legacy,
    /// Namespace/room multi-channel generation (Socket.IO 1.4+ adapters).
    #[default]
    Current,
}

impl ProtocolVersion {
    /// Returns `true` if envelopes carry the emitter uid.
    #[must_use]
    pub const fn carries_uid(self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Current => f.write_str("current"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = EmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "0.9.9" | "v0_9_9" => Ok(Self::Legacy),
            "current" | "1.4.4" | "v1_4_4" => Ok(Self::Current),
            other => Err(EmitterError::Configuration(format!(
                "unknown protocol version '{other}'"
            ))),
        }
    }
}
