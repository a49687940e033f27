//! RFC 3339 codec for the CloudEvents `time` attribute.
//!
//! An unset time is modelled as `None` rather than a sentinel instant, so the
//! Unix epoch stays a legitimate value. On the wire, `None` is JSON `null`;
//! the strings `"null"` and `""` are also read as unset.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("invalid RFC 3339 timestamp {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid RFC 3339 timestamp {input:?}: expected 'T' between date and time")]
    MissingSeparator { input: String },
}

/// Parse RFC 3339 text (optionally still wrapped in quotes).
///
/// Returns `Ok(None)` for `null` / empty input. Offsets are converted to UTC.
pub fn parse_timestamp(text: &str) -> Result<Option<DateTime<Utc>>, TimestampError> {
    let raw = text.trim_matches('"');
    if raw.is_empty() || raw == "null" {
        return Ok(None);
    }

    // chrono also accepts a space here; RFC 3339 date-time does not.
    if raw
        .as_bytes()
        .get(10)
        .is_some_and(|&sep| !matches!(sep, b'T' | b't'))
    {
        return Err(TimestampError::MissingSeparator {
            input: raw.to_string(),
        });
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| Some(parsed.with_timezone(&Utc)))
        .map_err(|source| TimestampError::Parse {
            input: raw.to_string(),
            source,
        })
}

/// Format with whole-second precision and a `Z` suffix, e.g. `2024-05-01T10:00:00Z`.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `#[serde(with = "...")]` adapter for `Option<DateTime<Utc>>` fields.
pub mod rfc3339_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&super::format_timestamp(time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => super::parse_timestamp(&text).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}
