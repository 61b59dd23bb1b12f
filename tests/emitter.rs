//! End-to-end emits against the in-memory transport.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use proptest::prelude::*;
use rmpv::Value;
use serde::Serialize;

use socketio_emitter::codec::timestamp::{self, iso8601};
use socketio_emitter::config::{EmitterConfig, RoomSelection};
use socketio_emitter::domain::{PacketType, Payload};
use socketio_emitter::emitter::Emitter;
use socketio_emitter::protocol::{DecodedEnvelope, ProtocolVersion};
use socketio_emitter::transport::MemoryTransport;

fn config(version: ProtocolVersion) -> EmitterConfig {
    EmitterConfig::new("localhost", 6379)
        .with_protocol_version(version)
        .with_uid("emitter-it")
}

fn emitter(version: ProtocolVersion) -> Emitter<Arc<MemoryTransport>> {
    Emitter::new(&config(version), Arc::new(MemoryTransport::new()))
}

fn decode_all(emitter: &Emitter<Arc<MemoryTransport>>) -> Vec<DecodedEnvelope> {
    emitter
        .transport()
        .published()
        .iter()
        .map(|message| {
            let Ok(envelope) = emitter.encoder().decode(&message.payload) else {
                panic!("published bytes do not decode");
            };
            envelope
        })
        .collect()
}

#[test]
fn chat_room_emit_publishes_on_room_channel() {
    let emitter = emitter(ProtocolVersion::Current);
    let Ok(outcome) = emitter.of("/chat").to("lobby").emit("msg", "hi") else {
        panic!("emit failed");
    };

    assert_eq!(outcome.channels, vec!["socket.io#/chat#lobby#"]);
    assert_eq!(outcome.packet_type, PacketType::Event);

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert_eq!(envelope.uid.as_deref(), Some("emitter-it"));
    assert_eq!(envelope.packet.event_name(), "msg");
    assert_eq!(envelope.packet.payload().as_str(), Some("hi"));
    assert_eq!(envelope.packet.namespace(), "/chat");
    assert_eq!(envelope.rooms, vec!["lobby"]);
    assert!(envelope.flags.is_empty());
}

#[test]
fn no_rooms_publishes_once_on_namespace_channel() {
    let emitter = emitter(ProtocolVersion::Current);
    let Ok(outcome) = emitter.of("/admin").volatile().emit("ping", 1_i64) else {
        panic!("emit failed");
    };
    assert_eq!(outcome.channels, vec!["socket.io#/admin#"]);
    assert_eq!(emitter.transport().attempts(), 1);

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert!(envelope.rooms.is_empty());
    assert_eq!(envelope.flags, vec![("volatile".to_string(), Value::from(true))]);
}

#[test]
fn legacy_publishes_once_with_rooms_in_envelope() {
    let emitter = emitter(ProtocolVersion::Legacy);
    let Ok(outcome) = emitter.rooms(["a", "b"]).emit("news", "x") else {
        panic!("emit failed");
    };
    assert_eq!(outcome.channels, vec!["socket.io#emitter"]);

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert_eq!(envelope.uid, None);
    assert_eq!(envelope.rooms, vec!["a", "b"]);
}

#[test]
fn scope_does_not_leak_into_next_emit() {
    let emitter = emitter(ProtocolVersion::Current);
    let Ok(_) = emitter.to("room1").json().emit("first", "x") else {
        panic!("emit failed");
    };
    let Ok(second) = emitter.emit("second", "y") else {
        panic!("emit failed");
    };
    assert_eq!(second.channels, vec!["socket.io#/#"]);

    let envelopes = decode_all(&emitter);
    let [_, last] = envelopes.as_slice() else {
        panic!("expected two publishes");
    };
    assert!(last.rooms.is_empty());
    assert!(last.flags.is_empty());
}

#[test]
fn failed_emit_leaves_emitter_clean() {
    let transport = Arc::new(MemoryTransport::failing_at(1));
    let emitter = Emitter::new(&config(ProtocolVersion::Current), Arc::clone(&transport));

    assert!(emitter.to("doomed").emit("e", "x").is_err());
    assert!(transport.published().is_empty());

    let Ok(outcome) = emitter.emit("e", "x") else {
        panic!("emit after failure failed");
    };
    assert_eq!(outcome.channels, vec!["socket.io#/#"]);
}

#[test]
fn failure_at_room_k_stops_and_names_its_channel() {
    let transport = Arc::new(MemoryTransport::failing_at(2));
    let emitter = Emitter::new(&config(ProtocolVersion::Current), Arc::clone(&transport));

    let Err(err) = emitter.rooms(["r1", "r2", "r3"]).emit("e", "x") else {
        panic!("expected a transport error");
    };
    assert!(err.is_retryable());
    assert!(err.to_string().contains("socket.io#/#r2#"));
    assert_eq!(transport.channels(), vec!["socket.io#/#r1#"]);
    assert_eq!(transport.attempts(), 2);
}

#[test]
fn binary_argument_marks_binary_event() {
    let emitter = emitter(ProtocolVersion::Current);
    let args = [Payload::from("upload"), Payload::binary(vec![0_u8, 1, 2])];
    let Ok(outcome) = emitter.emit_args(&args) else {
        panic!("emit failed");
    };
    assert_eq!(outcome.packet_type, PacketType::BinaryEvent);

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert_eq!(envelope.packet.packet_type(), PacketType::BinaryEvent);
    assert!(envelope.packet.payload().is_binary());
}

#[test]
fn cumulative_selection_accumulates_rooms() {
    let config = config(ProtocolVersion::Current).with_room_selection(RoomSelection::Cumulative);
    let emitter = Emitter::new(&config, Arc::new(MemoryTransport::new()));
    let Ok(outcome) = emitter.to("a").to("b").emit("e", "x") else {
        panic!("emit failed");
    };
    assert_eq!(outcome.channels, vec!["socket.io#/#a#", "socket.io#/#b#"]);
}

#[test]
fn timestamp_payload_survives_the_wire() {
    let Some(naive) = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_nano_opt(12, 30, 45, 123_456_700))
    else {
        panic!("invalid test date");
    };
    let at: DateTime<Utc> = naive.and_utc();

    let emitter = emitter(ProtocolVersion::Current);
    let Ok(_) = emitter.emit("tick", &Payload::timestamp(&at)) else {
        panic!("emit failed");
    };

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert_eq!(
        envelope.packet.payload().as_str(),
        Some("2024-03-01T12:30:45.1234567Z")
    );
    let Ok(Some(decoded)) = timestamp::from_value(envelope.packet.payload().as_value()) else {
        panic!("payload is not a timestamp");
    };
    assert_eq!(decoded, at.fixed_offset());
}

#[tokio::test]
async fn async_failure_at_room_k_stops_and_names_its_channel() {
    let transport = Arc::new(MemoryTransport::failing_at(2));
    let emitter = Emitter::new(&config(ProtocolVersion::Current), Arc::clone(&transport));

    let Err(err) = emitter.rooms(["r1", "r2", "r3"]).emit_async("e", "x").await else {
        panic!("expected a transport error");
    };
    assert!(err.is_retryable());
    assert!(err.to_string().contains("socket.io#/#r2#"));
    assert_eq!(transport.attempts(), 2);
    assert_eq!(transport.channels(), vec!["socket.io#/#r1#"]);
}

#[test]
fn raw_byte_vector_emits_binary_event() {
    let emitter = emitter(ProtocolVersion::Current);
    let Ok(outcome) = emitter.emit("e", &vec![1_u8, 2, 3]) else {
        panic!("emit failed");
    };
    assert_eq!(outcome.packet_type, PacketType::BinaryEvent);

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    assert_eq!(envelope.packet.payload().as_value(), &Value::Binary(vec![1, 2, 3]));
}

#[test]
fn chrono_value_emitted_directly_uses_wire_form() {
    let Some(at) = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_nano_opt(12, 30, 45, 123_456_700))
        .map(|n| n.and_utc())
    else {
        panic!("invalid test date");
    };

    let emitter = emitter(ProtocolVersion::Current);
    let Ok(_) = emitter.emit("tick", at) else {
        panic!("emit failed");
    };
    let Ok(_) = emitter.emit("tick", None::<DateTime<Utc>>) else {
        panic!("emit failed");
    };

    let envelopes = decode_all(&emitter);
    let [some, none] = envelopes.as_slice() else {
        panic!("expected two publishes");
    };
    assert_eq!(some.packet.payload().as_str(), Some("2024-03-01T12:30:45.1234567Z"));
    assert_eq!(none.packet.payload().as_value(), &Value::Nil);
}

#[derive(Serialize)]
struct Tick {
    name: &'static str,
    #[serde(with = "iso8601")]
    at: DateTime<Utc>,
}

#[test]
fn tagged_struct_field_uses_wire_form() {
    let Some(at) = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(12, 30, 45))
        .map(|n| n.and_utc())
    else {
        panic!("invalid test date");
    };

    let emitter = emitter(ProtocolVersion::Current);
    let Ok(_) = emitter.emit_serialize("tick", &Tick { name: "t", at }) else {
        panic!("emit failed");
    };

    let envelopes = decode_all(&emitter);
    let [envelope] = envelopes.as_slice() else {
        panic!("expected exactly one publish");
    };
    let Value::Map(fields) = envelope.packet.payload().as_value() else {
        panic!("expected a map payload");
    };
    let at_field = fields
        .iter()
        .find(|(k, _)| k.as_str() == Some("at"))
        .and_then(|(_, v)| v.as_str());
    assert_eq!(at_field, Some("2024-03-01T12:30:45.0000000Z"));
}

#[tokio::test]
async fn async_emit_publishes_rooms_in_order() {
    let emitter = emitter(ProtocolVersion::Current);
    let Ok(outcome) = emitter
        .of("/game")
        .rooms(["red", "blue"])
        .emit_async("score", &serde_json::json!({ "red": 3, "blue": 1 }))
        .await
    else {
        panic!("emit failed");
    };
    assert_eq!(outcome.channels, vec!["socket.io#/game#red#", "socket.io#/game#blue#"]);
    assert_eq!(emitter.transport().channels(), outcome.channels);
}

proptest! {
    #[test]
    fn every_room_receives_identical_bytes(
        rooms in prop::collection::btree_set("[a-z0-9]{1,12}", 1..8)
    ) {
        let emitter = emitter(ProtocolVersion::Current);
        let outcome = emitter.rooms(rooms.iter().cloned()).emit("e", "payload");
        prop_assert!(outcome.is_ok());

        let published = emitter.transport().published();
        prop_assert_eq!(published.len(), rooms.len());
        let expected: Vec<String> = rooms.iter().map(|r| format!("socket.io#/#{r}#")).collect();
        let channels: Vec<String> = published.iter().map(|m| m.channel.clone()).collect();
        prop_assert_eq!(channels, expected);
        let identical = published.windows(2).all(|w| match w {
            [a, b] => a.payload == b.payload,
            _ => false,
        });
        prop_assert!(identical);
    }
}
