//! Blocking HTTP client for a remote event store.
//!
//! ```no_run
//! use eventstore_client::{Config, Event, EventStoreClient};
//! use serde_json::json;
//!
//! # fn main() -> eventstore_client::ClientResult<()> {
//! let client = EventStoreClient::new(Config::new("https://es.example.com", "v1", "token")?)?;
//!
//! client.commit_events(vec![Event::new("/user/42", "user.added", json!({"name": "Ada"}))])?;
//! for event in client.event_stream("/user/42")? {
//!     println!("{}", event?.event_type);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod stream;
pub mod testing;
pub mod transport;

pub use client::{EventStoreClient, USER_AGENT};
pub use stream::{EventStream, QueryStream};
pub use testing::MockTransport;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

pub use eventstore_core::{
    BoxError, ClientError, ClientResult, Config, ConfigError, ENV_API_URL, ENV_API_VERSION,
    ENV_AUTH_TOKEN,
};
pub use eventstore_events::{
    DEFAULT_DATA_CONTENT_TYPE, DEFAULT_SPEC_VERSION, Event, NdjsonDecoder, format_timestamp,
    normalize, normalize_at, parse_timestamp,
};
