//! Serialize/deserialize boundary between in-memory store state and durable
//! storage.
//!
//! Decoding is deliberately forgiving: corrupt or missing persisted state
//! means "start fresh", not an error worth surfacing. `decode` returns
//! `None` on any structural failure and the caller substitutes its
//! compiled-in default. Store shapes put `#[serde(default)]` on every field
//! so data written by an older version keeps loading after new optional
//! fields appear.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Encode a store state as canonical JSON text. Temporal values serialize
/// in their ISO 8601 / RFC 3339 textual form via chrono's serde impls.
pub fn encode<T: Serialize>(state: &T) -> Option<String> {
    serde_json::to_string_pretty(state).ok()
}

/// Decode persisted text back into a store state, or `None` if the text is
/// not valid or does not match the expected shape. Never panics.
pub fn decode<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(text).ok()
}

/// Lenient deserializer for optional temporal values: anything missing,
/// null, non-string, or unparseable decodes as absent — never as "now" and
/// never as an error that would poison the whole decode.
///
/// Use as `#[serde(default, deserialize_with = "lenient")]`.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|value| value.as_str())
        .and_then(|text| text.parse().ok()))
}
