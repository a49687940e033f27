//! CloudEvents records and the newline-delimited JSON wire format.
//!
//! - [`Event`]: the CloudEvents envelope exchanged with the store.
//! - [`timestamp`]: RFC 3339 codec for the `time` attribute.
//! - [`normalize`]: fills the attributes a caller may leave unset.
//! - [`ndjson`]: incremental decoder for streamed response bodies.

pub mod event;
pub mod ndjson;
pub mod normalize;
pub mod timestamp;

pub use event::{DEFAULT_DATA_CONTENT_TYPE, DEFAULT_SPEC_VERSION, Event};
pub use ndjson::NdjsonDecoder;
pub use normalize::{normalize, normalize_at};
pub use timestamp::{TimestampError, format_timestamp, parse_timestamp};
