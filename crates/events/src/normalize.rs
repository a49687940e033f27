//! CloudEvents defaulting.
//!
//! Outbound events must leave the client with every envelope attribute set,
//! and inbound lines may omit them, so both paths run through [`normalize`].
//! Each attribute is handled independently:
//!
//! | attribute | defaulted when | default |
//! |---|---|---|
//! | `id` | empty | fresh UUID v4 |
//! | `source` | empty | configured API URL |
//! | `datacontenttype` | empty | `application/json` |
//! | `specversion` | empty | `1.0` |
//! | `time` | unset | now (UTC, whole seconds) |
//!
//! `subject`, `type` and `data` are never touched.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use eventstore_core::Config;

use crate::event::{DEFAULT_DATA_CONTENT_TYPE, DEFAULT_SPEC_VERSION, Event};

/// Fill unset envelope attributes, stamping missing times with the current instant.
pub fn normalize(event: Event, config: &Config) -> Event {
    normalize_at(event, config, Utc::now())
}

/// Same as [`normalize`] with an explicit "now".
///
/// `now` is truncated to whole seconds so the in-memory value matches what
/// goes over the wire.
pub fn normalize_at(mut event: Event, config: &Config, now: DateTime<Utc>) -> Event {
    if event.id.is_empty() {
        event.id = Uuid::new_v4().to_string();
    }
    if event.source.is_empty() {
        event.source = config.api_url().to_string();
    }
    if event.data_content_type.is_empty() {
        event.data_content_type = DEFAULT_DATA_CONTENT_TYPE.to_string();
    }
    if event.spec_version.is_empty() {
        event.spec_version = DEFAULT_SPEC_VERSION.to_string();
    }
    if event.time.is_none() {
        event.time = Some(now.trunc_subsecs(0));
    }
    event
}
