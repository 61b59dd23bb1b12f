//! Channel naming.
//!
//! Legacy adapters listen on a single `prefix#emitter` channel and filter
//! rooms from the envelope. Current adapters subscribe per namespace and
//! per room, so the room lives in the channel name:
//!
//! ```text
//! socket.io#emitter          legacy
//! socket.io#/chat#           current, whole namespace
//! socket.io#/chat#lobby#     current, one room
//! ```

use super::ProtocolVersion;
use crate::domain::Scope;

/// Suffix of the single legacy channel.
pub const LEGACY_CHANNEL_SUFFIX: &str = "#emitter";

/// The single legacy channel.
#[must_use]
pub fn legacy_channel(prefix: &str) -> String {
    format!("{prefix}{LEGACY_CHANNEL_SUFFIX}")
}

/// The channel addressing a whole namespace.
#[must_use]
pub fn namespace_channel(prefix: &str, namespace: &str) -> String {
    format!("{prefix}#{namespace}#")
}

/// The channel addressing one room of a namespace.
#[must_use]
pub fn room_channel(prefix: &str, namespace: &str, room: &str) -> String {
    format!("{prefix}#{namespace}#{room}#")
}

/// All channels an envelope for `scope` must be published on, in order.
#[must_use]
pub fn channels_for(version: ProtocolVersion, prefix: &str, scope: &Scope) -> Vec<String> {
    match version {
        ProtocolVersion::Legacy => vec![legacy_channel(prefix)],
        ProtocolVersion::Current if scope.rooms().is_empty() => {
            vec![namespace_channel(prefix, scope.namespace())]
        }
        ProtocolVersion::Current => scope
            .rooms()
            .iter()
            .map(|room| room_channel(prefix, scope.namespace(), room))
            .collect(),
    }
}

/// The `PSUBSCRIBE` pattern matching every channel an emitter with this
/// prefix can publish on.
#[must_use]
pub fn subscription_pattern(version: ProtocolVersion, prefix: &str) -> String {
    match version {
        ProtocolVersion::Legacy => legacy_channel(prefix),
        ProtocolVersion::Current => format!("{prefix}#*"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn legacy_ignores_rooms() {
        let mut scope = Scope::new();
        scope.set_rooms(["a", "b", "c"]);
        assert_eq!(
            channels_for(ProtocolVersion::Legacy, "socket.io", &scope),
            vec!["socket.io#emitter"]
        );
    }

    #[test]
    fn current_without_rooms_targets_namespace() {
        let mut scope = Scope::new();
        scope.set_namespace("/chat");
        assert_eq!(
            channels_for(ProtocolVersion::Current, "socket.io", &scope),
            vec!["socket.io#/chat#"]
        );
    }

    #[test]
    fn current_fans_out_per_room_in_order() {
        let mut scope = Scope::new();
        scope.set_rooms(["r2", "r1"]);
        assert_eq!(
            channels_for(ProtocolVersion::Current, "app", &scope),
            vec!["app#/#r2#", "app#/#r1#"]
        );
    }

    #[test]
    fn patterns() {
        assert_eq!(subscription_pattern(ProtocolVersion::Legacy, "x"), "x#emitter");
        assert_eq!(subscription_pattern(ProtocolVersion::Current, "x"), "x#*");
    }
}
