//! Emit target: namespace, rooms and flags.

use rmpv::Value;

use crate::config::RoomSelection;

/// Namespace used when none is selected.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Where an event goes and the flags forwarded with it.
///
/// Rooms keep insertion order and never contain duplicates, so channel
/// fan-out order is reproducible. Flags are forwarded to the gateway
/// as-is and never interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    namespace: String,
    rooms: Vec<String>,
    flags: Vec<(String, Value)>,
}

impl Default for Scope {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            rooms: Vec::new(),
            flags: Vec::new(),
        }
    }
}

impl Scope {
    /// Creates a scope targeting every socket of the default namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the namespace. An empty name selects the default one.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            namespace
        };
    }

    /// Adds a room unless it is already targeted.
    pub fn add_room(&mut self, room: impl Into<String>) {
        let room = room.into();
        if !self.rooms.contains(&room) {
            self.rooms.push(room);
        }
    }

    /// Targets `room` according to `selection`.
    pub fn select_room(&mut self, room: impl Into<String>, selection: RoomSelection) {
        if selection == RoomSelection::Replace {
            self.rooms.clear();
        }
        self.add_room(room);
    }

    /// Replaces the targeted rooms with `rooms` (de-duplicated, in order).
    pub fn set_rooms<I, S>(&mut self, rooms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rooms.clear();
        for room in rooms {
            self.add_room(room);
        }
    }

    /// Sets a flag, overwriting any previous value under the same name.
    pub fn set_flag(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.flags.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.flags.push((name, value)),
        }
    }

    /// Selected namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Targeted rooms in selection order.
    #[must_use]
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    /// Flags in insertion order.
    #[must_use]
    pub fn flags(&self) -> &[(String, Value)] {
        &self.flags
    }

    /// Looks up a flag by name.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// The options map sent next to the packet: `{ rooms, flags }`.
    ///
    /// Empty collections are sent as the empty string, which is what the
    /// gateway adapter tests for.
    #[must_use]
    pub fn options_value(&self) -> Value {
        let rooms = if self.rooms.is_empty() {
            Value::from("")
        } else {
            Value::Array(self.rooms.iter().map(|r| Value::from(r.as_str())).collect())
        };
        let flags = if self.flags.is_empty() {
            Value::from("")
        } else {
            Value::Map(
                self.flags
                    .iter()
                    .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                    .collect(),
            )
        };
        Value::Map(vec![
            (Value::from("rooms"), rooms),
            (Value::from("flags"), flags),
        ])
    }
}
