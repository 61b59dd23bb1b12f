//! ISO-8601 timestamp handler.
//!
//! The gateway's MessagePack path does not understand the native
//! MessagePack timestamp extension, so timestamps travel as round-trip
//! ISO-8601 strings with seven fractional digits:
//!
//! ```text
//! 2024-03-01T12:30:45.1234567Z       UTC or offset-less source value
//! 2024-03-01T14:30:45.1234567+02:00  source value with an explicit offset
//! ```
//!
//! A missing (`None`) timestamp encodes as MessagePack nil, never as an
//! empty string.
//!
//! Struct fields opt in with `#[serde(with = "iso8601")]` or
//! `#[serde(with = "iso8601::option")]`.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use rmpv::Value;

use crate::error::EmitterError;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A timestamp type with a round-trip ISO-8601 rendering.
pub trait IsoTimestamp {
    /// Renders the value as `YYYY-MM-DDTHH:MM:SS.fffffff` plus `Z` or
    /// an explicit `+HH:MM` offset.
    fn to_iso8601(&self) -> String;
}

impl IsoTimestamp for DateTime<Utc> {
    fn to_iso8601(&self) -> String {
        render(&self.naive_utc(), "Z")
    }
}

impl IsoTimestamp for NaiveDateTime {
    /// Offset-less values are taken to be UTC.
    fn to_iso8601(&self) -> String {
        render(self, "Z")
    }
}

impl IsoTimestamp for DateTime<FixedOffset> {
    fn to_iso8601(&self) -> String {
        let offset = self.offset().to_string();
        render(&self.naive_local(), &offset)
    }
}

impl IsoTimestamp for DateTime<Local> {
    fn to_iso8601(&self) -> String {
        self.fixed_offset().to_iso8601()
    }
}

fn render(naive: &NaiveDateTime, suffix: &str) -> String {
    // 100ns ticks; a leap second reports >= 1e9 nanos, clamp into range
    let ticks = naive.and_utc().timestamp_subsec_nanos().min(999_999_999) / 100;
    format!("{}.{ticks:07}{suffix}", naive.format(DATE_TIME_FORMAT))
}

/// Parses an ISO-8601 timestamp produced by [`IsoTimestamp::to_iso8601`]
/// (or any RFC 3339 string). Strings without an offset are read as UTC.
///
/// # Errors
///
/// Returns [`EmitterError::Decoding`] if the string is not a timestamp.
pub fn parse_iso8601(raw: &str) -> Result<DateTime<FixedOffset>, EmitterError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|e| EmitterError::Decoding(format!("invalid timestamp '{raw}': {e}")))
}

/// Converts a timestamp into its wire value (a string).
#[must_use]
pub fn to_value<T: IsoTimestamp + ?Sized>(ts: &T) -> Value {
    Value::from(ts.to_iso8601())
}

/// Converts an optional timestamp into its wire value; `None` is nil.
#[must_use]
pub fn optional_to_value<T: IsoTimestamp>(ts: Option<&T>) -> Value {
    ts.map_or(Value::Nil, to_value)
}

/// Reads a wire value back into an optional timestamp.
///
/// # Errors
///
/// Returns [`EmitterError::Decoding`] if the value is neither nil nor a
/// timestamp string.
pub fn from_value(value: &Value) -> Result<Option<DateTime<FixedOffset>>, EmitterError> {
    match value {
        Value::Nil => Ok(None),
        Value::String(s) => {
            let raw = s
                .as_str()
                .ok_or_else(|| EmitterError::Decoding("timestamp is not valid UTF-8".into()))?;
            parse_iso8601(raw).map(Some)
        }
        other => Err(EmitterError::Decoding(format!(
            "expected timestamp string or nil, found {other}"
        ))),
    }
}

/// Serde adapter for timestamp struct fields.
pub mod iso8601 {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{IsoTimestamp, parse_iso8601};

    /// Serializes a timestamp as its ISO-8601 string.
    ///
    /// # Errors
    ///
    /// Propagates the serializer's error.
    pub fn serialize<T, S>(ts: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: IsoTimestamp,
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_iso8601())
    }

    /// Deserializes an ISO-8601 string.
    ///
    /// # Errors
    ///
    /// Fails if the input is not a timestamp string.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: From<DateTime<FixedOffset>>,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_iso8601(&raw)
            .map(T::from)
            .map_err(serde::de::Error::custom)
    }

    /// Serde adapter for nullable timestamp fields; `None` is nil.
    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::{IsoTimestamp, parse_iso8601};

        /// Serializes `Some` as an ISO-8601 string and `None` as nil.
        ///
        /// # Errors
        ///
        /// Propagates the serializer's error.
        pub fn serialize<T, S>(ts: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: IsoTimestamp,
            S: Serializer,
        {
            match ts {
                Some(ts) => serializer.serialize_some(&ts.to_iso8601()),
                None => serializer.serialize_none(),
            }
        }

        /// Deserializes nil as `None` and a string as `Some`.
        ///
        /// # Errors
        ///
        /// Fails if the input is neither nil nor a timestamp string.
        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: From<DateTime<FixedOffset>>,
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| {
                    parse_iso8601(&raw)
                        .map(T::from)
                        .map_err(serde::de::Error::custom)
                })
                .transpose()
        }
    }
}
