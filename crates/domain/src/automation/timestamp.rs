//! Serde adapter for optional RFC 3339 run markers.
//!
//! The backend writes an empty string for "never"; `null` is accepted too.

use serde::{Deserialize, Deserializer, Serializer};

use crate::time::Timestamp;

#[allow(clippy::ref_option)]
pub fn serialize<S: Serializer>(
    value: &Option<Timestamp>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
        None => serializer.serialize_str(""),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Timestamp>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => chrono::DateTime::parse_from_rfc3339(text)
            .map(|ts| Some(ts.with_timezone(&chrono::Utc)))
            .map_err(serde::de::Error::custom),
    }
}
