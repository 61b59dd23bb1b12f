//! Emitter configuration loaded from environment variables or built in code.
//!
//! Follows 12-factor style: every setting can come from an environment
//! variable (or a `.env` file via `dotenvy`), and every setting can be
//! overridden with the builder-style `with_*` methods.
//!
//! | Variable                   | Default          |
//! |----------------------------|------------------|
//! | `EMITTER_REDIS_HOST`       | unset            |
//! | `EMITTER_REDIS_PORT`       | unset            |
//! | `EMITTER_REDIS_DB`         | `0`              |
//! | `EMITTER_REDIS_PASSWORD`   | unset            |
//! | `EMITTER_KEY`              | `socket.io`      |
//! | `EMITTER_PROTOCOL_VERSION` | `current`        |
//! | `EMITTER_UID`              | `emitter-<uuid>` |
//! | `EMITTER_ROOM_SELECTION`   | `replace`        |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmitterError;
use crate::protocol::ProtocolVersion;

/// Key prefix used when none (or a blank one) is configured.
pub const DEFAULT_KEY_PREFIX: &str = "socket.io";

/// How `to`/`in_room` combine with rooms already selected on a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomSelection {
    /// Each `to`/`in_room` call replaces the target with that single room.
    /// Multi-room targets are set explicitly with `rooms(..)`.
    #[default]
    Replace,
    /// Each `to`/`in_room` call adds a room (de-duplicated), matching the
    /// historical `In` behavior.
    Cumulative,
}

impl fmt::Display for RoomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Cumulative => f.write_str("cumulative"),
        }
    }
}

impl FromStr for RoomSelection {
    type Err = EmitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" | "exclusive" => Ok(Self::Replace),
            "cumulative" | "append" => Ok(Self::Cumulative),
            other => Err(EmitterError::Configuration(format!(
                "unknown room selection '{other}'"
            ))),
        }
    }
}

/// Connection parameters for the Redis bus.
///
/// `host` and `port` are required unless the caller supplies an already
/// open connection to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusConfig {
    /// Redis host name or address.
    pub host: Option<String>,
    /// Redis TCP port.
    pub port: Option<u16>,
    /// Logical database index.
    pub db: i64,
    /// Optional `AUTH` password.
    pub password: Option<String>,
}

impl BusConfig {
    /// Creates a bus configuration for `host:port` on database 0.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            ..Self::default()
        }
    }

    /// Renders the `redis://` connection URL.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Configuration`] if the host is missing or
    /// blank, or the port is missing or zero.
    pub fn url(&self) -> Result<String, EmitterError> {
        let host = self
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| EmitterError::Configuration("missing redis 'host'".to_string()))?;
        let port = self
            .port
            .filter(|p| *p != 0)
            .ok_or_else(|| EmitterError::Configuration("missing redis 'port'".to_string()))?;

        let auth = match self.password.as_deref() {
            Some(pw) if !pw.is_empty() => format!(":{pw}@"),
            _ => String::new(),
        };
        Ok(format!("redis://{auth}{host}:{port}/{}", self.db))
    }
}

/// Immutable construction-time configuration of an emitter.
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Channel key prefix (`socket.io` by default).
    pub key_prefix: String,
    /// Protocol generation spoken on the bus.
    pub protocol_version: ProtocolVersion,
    /// Identifier placed at the head of current-version envelopes.
    pub uid: String,
    /// Combination rule for successive room selections.
    pub room_selection: RoomSelection,
    /// Bus connection parameters.
    pub bus: BusConfig,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            protocol_version: ProtocolVersion::default(),
            uid: generate_uid(),
            room_selection: RoomSelection::default(),
            bus: BusConfig::default(),
        }
    }
}

impl EmitterConfig {
    /// Creates a default configuration targeting `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            bus: BusConfig::new(host, port),
            ..Self::default()
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Unset variables fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::Configuration`] if a variable is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, EmitterError> {
        dotenvy::dotenv().ok();

        let port = match std::env::var("EMITTER_REDIS_PORT") {
            Ok(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                EmitterError::Configuration(format!("invalid EMITTER_REDIS_PORT '{raw}': {e}"))
            })?),
            Err(_) => None,
        };

        let bus = BusConfig {
            host: std::env::var("EMITTER_REDIS_HOST").ok(),
            port,
            db: parse_env("EMITTER_REDIS_DB", 0),
            password: std::env::var("EMITTER_REDIS_PASSWORD").ok(),
        };

        let protocol_version = match std::env::var("EMITTER_PROTOCOL_VERSION") {
            Ok(raw) => raw.parse()?,
            Err(_) => ProtocolVersion::default(),
        };
        let room_selection = match std::env::var("EMITTER_ROOM_SELECTION") {
            Ok(raw) => raw.parse()?,
            Err(_) => RoomSelection::default(),
        };

        let mut config = Self {
            protocol_version,
            room_selection,
            bus,
            ..Self::default()
        };
        if let Ok(key) = std::env::var("EMITTER_KEY") {
            config = config.with_key_prefix(key);
        }
        if let Ok(uid) = std::env::var("EMITTER_UID") {
            config = config.with_uid(uid);
        }
        Ok(config)
    }

    /// Sets the channel key prefix. A blank prefix keeps the default.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.key_prefix = if prefix.trim().is_empty() {
            DEFAULT_KEY_PREFIX.to_string()
        } else {
            prefix
        };
        self
    }

    /// Sets the protocol generation.
    #[must_use]
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Sets the emitter uid. A blank uid keeps the generated one.
    #[must_use]
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        let uid = uid.into();
        if !uid.trim().is_empty() {
            self.uid = uid;
        }
        self
    }

    /// Sets the room selection rule.
    #[must_use]
    pub fn with_room_selection(mut self, selection: RoomSelection) -> Self {
        self.room_selection = selection;
        self
    }

    /// Replaces the bus connection parameters.
    #[must_use]
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }
}

/// Generates a per-process emitter uid.
fn generate_uid() -> String {
    format!("emitter-{}", uuid::Uuid::new_v4())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
