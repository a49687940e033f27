use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::timestamp::rfc3339_option;

/// Default `datacontenttype` attribute.
pub const DEFAULT_DATA_CONTENT_TYPE: &str = "application/json";

/// Default `specversion` attribute.
pub const DEFAULT_SPEC_VERSION: &str = "1.0";

/// A CloudEvents envelope exchanged with the event store.
///
/// This is the unit you commit to, and read back from, a subject.
///
/// Notes:
/// - `subject` addresses the target resource (e.g. `/user/42`) and `event_type`
///   names what happened (e.g. `"added"`). Both are supplied by the caller and
///   are never defaulted.
/// - `id`, `source`, `time`, `data_content_type` and `spec_version` may be left
///   unset; [`crate::normalize`] fills them before a commit and after a read.
/// - `data` is the domain payload, kept as an order-preserving JSON value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(default)]
    pub subject: String,

    #[serde(rename = "type", default)]
    pub event_type: String,

    /// Serialized as JSON `null` while unset.
    #[serde(default, with = "rfc3339_option")]
    pub time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: JsonValue,

    #[serde(
        rename = "datacontenttype",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub data_content_type: String,

    #[serde(
        rename = "specversion",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub spec_version: String,
}

impl Event {
    /// Create an event with only the caller-owned attributes set.
    pub fn new(subject: impl Into<String>, event_type: impl Into<String>, data: JsonValue) -> Self {
        Self {
            subject: subject.into(),
            event_type: event_type.into(),
            data,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_data_content_type(mut self, data_content_type: impl Into<String>) -> Self {
        self.data_content_type = data_content_type.into();
        self
    }

    pub fn with_spec_version(mut self, spec_version: impl Into<String>) -> Self {
        self.spec_version = spec_version.into();
        self
    }

    /// True when every defaultable attribute is populated.
    pub fn is_normalized(&self) -> bool {
        !self.id.is_empty()
            && !self.source.is_empty()
            && self.time.is_some()
            && !self.data_content_type.is_empty()
            && !self.spec_version.is_empty()
    }
}
