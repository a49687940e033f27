//! Blocking client for the event store HTTP API.
//!
//! Operation mapping:
//!
//! | Client method | HTTP | Response |
//! | --- | --- | --- |
//! | `event_stream` / `stream_events` | `POST /api/{v}/stream` | NDJSON events, normalized |
//! | `commit_events` | `POST /api/{v}/commit` | status only |
//! | `query_stream` / `query` | `POST /api/{v}/q` | NDJSON rows, untouched |
//! | `ping` | `GET /api/{v}/status/ping` | raw text |
//! | `audit` | `GET /api/{v}/status/audit` | raw text |
//!
//! Every call is one request and one response. Only `200 OK` counts as
//! success; anything else becomes [`ClientError::Api`] with the response body.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

use eventstore_core::{ClientError, ClientResult, Config};
use eventstore_events::{Event, normalize};

use crate::stream::{EventStream, QueryStream};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("inoovum-eventstore-sdk-rust/", env!("CARGO_PKG_VERSION"));

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_NDJSON: &str = "application/x-ndjson";

const PATH_STREAM: &str = "/stream";
const PATH_COMMIT: &str = "/commit";
const PATH_QUERY: &str = "/q";
const PATH_PING: &str = "/status/ping";
const PATH_AUDIT: &str = "/status/audit";

#[derive(Serialize)]
struct StreamRequest<'a> {
    subject: &'a str,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    events: &'a [Event],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Client for one event store deployment.
///
/// Holds only immutable configuration and a transport handle, so a single
/// instance can be shared across threads and reused after any failed call.
#[derive(Debug, Clone)]
pub struct EventStoreClient<T = ReqwestTransport> {
    config: Arc<Config>,
    transport: T,
}

impl EventStoreClient<ReqwestTransport> {
    /// Client over a default blocking `reqwest` transport.
    pub fn new(config: Config) -> ClientResult<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }

    /// Client configured from `EVENTSTORE_*` environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(Config::from_env()?)
    }
}

impl<T> EventStoreClient<T>
where
    T: Transport,
{
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open the event stream of `subject` and decode it lazily.
    ///
    /// Each event is normalized as it is yielded. The returned iterator ends
    /// at the first decode or transport failure.
    pub fn event_stream(&self, subject: &str) -> ClientResult<EventStream> {
        let response = self.post_json(PATH_STREAM, &StreamRequest { subject }, true)?;
        Ok(EventStream::new(response.into_body(), Arc::clone(&self.config)))
    }

    /// Read every event of `subject`.
    ///
    /// All-or-nothing: on failure, events decoded before it are discarded.
    pub fn stream_events(&self, subject: &str) -> ClientResult<Vec<Event>> {
        let events: Vec<Event> = self.event_stream(subject)?.collect::<ClientResult<_>>()?;
        tracing::debug!(subject, count = events.len(), "streamed events");
        Ok(events)
    }

    /// Normalize and commit a batch of events.
    ///
    /// Returns the batch exactly as transmitted (with generated ids, sources
    /// and times filled in). The server accepts or rejects the batch as a
    /// whole; the response body is not inspected.
    pub fn commit_events(&self, events: Vec<Event>) -> ClientResult<Vec<Event>> {
        let events: Vec<Event> = events
            .into_iter()
            .map(|event| normalize(event, &self.config))
            .collect();

        for (index, event) in events.iter().enumerate() {
            if event.subject.is_empty() || event.event_type.is_empty() {
                tracing::warn!(
                    index,
                    id = %event.id,
                    "committing event with empty subject or type"
                );
            }
        }

        self.post_json(PATH_COMMIT, &CommitRequest { events: &events }, false)?;
        tracing::debug!(count = events.len(), "committed events");
        Ok(events)
    }

    /// Run a query and decode result rows lazily.
    pub fn query_stream(&self, query: &str) -> ClientResult<QueryStream> {
        let response = self.post_json(PATH_QUERY, &QueryRequest { query }, true)?;
        Ok(QueryStream::new(response.into_body()))
    }

    /// Run a query and collect every result row.
    pub fn query(&self, query: &str) -> ClientResult<Vec<JsonValue>> {
        let rows: Vec<JsonValue> = self.query_stream(query)?.collect::<ClientResult<_>>()?;
        tracing::debug!(count = rows.len(), "query returned rows");
        Ok(rows)
    }

    /// Liveness probe; returns the response body verbatim.
    pub fn ping(&self) -> ClientResult<String> {
        self.get(PATH_PING)?.into_text()
    }

    /// Server-side audit check; returns the response body verbatim.
    pub fn audit(&self) -> ClientResult<String> {
        self.get(PATH_AUDIT)?.into_text()
    }

    fn post_json<B>(&self, path: &str, body: &B, ndjson: bool) -> ClientResult<HttpResponse>
    where
        B: Serialize,
    {
        let body = serde_json::to_vec(body)
            .map_err(|e| ClientError::request_build(format!("error marshaling request: {e}")))?;

        let mut request = self
            .request(Method::Post, path)
            .with_header("Content-Type", CONTENT_TYPE_JSON);
        if ndjson {
            request = request.with_header("Accept", CONTENT_TYPE_NDJSON);
        }

        self.execute(request.with_body(body))
    }

    fn get(&self, path: &str) -> ClientResult<HttpResponse> {
        self.execute(self.request(Method::Get, path))
    }

    fn request(&self, method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, self.config.endpoint(path))
            .with_header(
                "Authorization",
                format!("Bearer {}", self.config.auth_token()),
            )
            .with_header("User-Agent", USER_AGENT)
    }

    fn execute(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let response = self.transport.send(request)?;
        let status = response.status();
        if status != 200 {
            // Best effort: the status alone still identifies the failure.
            let body = response.into_text().unwrap_or_default();
            tracing::warn!(%method, %url, status, "event store returned an error status");
            return Err(ClientError::api(status, body));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use serde_json::json;
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn test_client() -> EventStoreClient<MockTransport> {
        let config = Config::new("https://es.example.com/", "v1", "secret-token").unwrap();
        EventStoreClient::with_transport(config, MockTransport::new())
    }

    fn sent_body(request: &HttpRequest) -> JsonValue {
        serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
    }

    /// Response body that records when it is dropped; optionally fails once
    /// its content is exhausted.
    struct TrackedBody {
        content: io::Cursor<Vec<u8>>,
        fail_at_end: bool,
        dropped: Arc<AtomicBool>,
    }

    impl TrackedBody {
        fn new(content: &str, fail_at_end: bool) -> (Self, Arc<AtomicBool>) {
            let dropped = Arc::new(AtomicBool::new(false));
            let body = Self {
                content: io::Cursor::new(content.as_bytes().to_vec()),
                fail_at_end,
                dropped: Arc::clone(&dropped),
            };
            (body, dropped)
        }
    }

    impl Read for TrackedBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.content.read(buf)? {
                0 if self.fail_at_end => Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
                n => Ok(n),
            }
        }
    }

    impl Drop for TrackedBody {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn response_body_is_released_on_every_exit_path() {
        let client = test_client();
        let event_line = "{\"subject\":\"/s\",\"type\":\"t\"}\n";

        let (body, success) = TrackedBody::new(event_line, false);
        client.transport().push_reader(200, body);
        assert_eq!(client.stream_events("/s").unwrap().len(), 1);
        assert!(success.load(Ordering::SeqCst), "released after success");

        let (body, decode) = TrackedBody::new("{\"subject\":\"/s\",\"type\":\"t\"}\n{broken\n", false);
        client.transport().push_reader(200, body);
        assert!(client.stream_events("/s").unwrap_err().is_decode());
        assert!(decode.load(Ordering::SeqCst), "released after decode failure");

        let (body, truncated) = TrackedBody::new(event_line, true);
        client.transport().push_reader(200, body);
        assert!(client.stream_events("/s").unwrap_err().is_transport());
        assert!(truncated.load(Ordering::SeqCst), "released after read failure");

        let (body, rejected) = TrackedBody::new("maintenance", false);
        client.transport().push_reader(503, body);
        assert_eq!(client.stream_events("/s").unwrap_err().status(), Some(503));
        assert!(rejected.load(Ordering::SeqCst), "released after non-200 status");

        let (body, ping) = TrackedBody::new("pong", false);
        client.transport().push_reader(200, body);
        assert_eq!(client.ping().unwrap(), "pong");
        assert!(ping.load(Ordering::SeqCst), "released after text response");
    }

    #[test]
    fn abandoned_event_stream_releases_its_body() {
        let client = test_client();
        let (body, dropped) = TrackedBody::new(
            "{\"subject\":\"/s\",\"type\":\"a\"}\n{\"subject\":\"/s\",\"type\":\"b\"}\n",
            false,
        );
        client.transport().push_reader(200, body);

        let mut stream = client.event_stream("/s").unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(!dropped.load(Ordering::SeqCst));

        drop(stream);
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<S: Send + Sync>() {}
        assert_send_sync::<EventStoreClient>();
        assert_send_sync::<EventStoreClient<MockTransport>>();
    }

    #[test]
    fn stream_events_posts_subject_with_ndjson_headers() {
        let client = test_client();
        client.transport().push_response(200, "");

        let events = client.stream_events("/user/42").unwrap();
        assert!(events.is_empty());

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://es.example.com/api/v1/stream");
        assert_eq!(request.header("Authorization"), Some("Bearer secret-token"));
        assert_eq!(request.header("User-Agent"), Some(USER_AGENT));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Accept"), Some("application/x-ndjson"));
        assert_eq!(sent_body(&request), json!({"subject": "/user/42"}));
    }

    #[test]
    fn streamed_events_are_normalized() {
        let client = test_client();
        client.transport().push_response(
            200,
            concat!(
                r#"{"subject":"/user/42","type":"added","data":{"name":"Ada"}}"#,
                "\n\n",
                r#"{"id":"evt-2","source":"urn:crm","subject":"/user/42","type":"updated","time":"2024-05-01T10:00:00Z","data":{"name":"Ada L."},"datacontenttype":"application/json","specversion":"1.0"}"#,
                "\n",
            ),
        );

        let events = client.stream_events("/user/42").unwrap();
        assert_eq!(events.len(), 2);

        assert!(events[0].is_normalized());
        assert!(!events[0].id.is_empty());
        assert_eq!(events[0].source, "https://es.example.com/");
        assert_eq!(events[0].data_content_type, "application/json");
        assert_eq!(events[0].spec_version, "1.0");

        assert_eq!(events[1].id, "evt-2");
        assert_eq!(events[1].source, "urn:crm");
        assert_eq!(
            events[1].time.map(|t| eventstore_events::format_timestamp(&t)),
            Some("2024-05-01T10:00:00Z".to_string())
        );
    }

    #[test]
    fn event_stream_yields_prefix_then_decode_error() {
        let client = test_client();
        client.transport().push_response(
            200,
            "{\"subject\":\"/s\",\"type\":\"t\"}\nnot json\n{\"subject\":\"/s\",\"type\":\"t\"}\n",
        );

        let mut stream = client.event_stream("/s").unwrap();
        assert!(stream.next().unwrap().is_ok());

        let err = stream.next().unwrap().unwrap_err();
        match err {
            ClientError::Decode { line, .. } => assert_eq!(line, "not json"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(stream.next().is_none());
        assert_eq!(stream.decoded(), 1);
    }

    #[test]
    fn stream_events_discards_prefix_on_failure() {
        let client = test_client();
        client
            .transport()
            .push_response(200, "{\"subject\":\"/s\",\"type\":\"t\"}\n{broken\n");

        let err = client.stream_events("/s").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn truncated_body_is_a_transport_error() {
        let client = test_client();
        client
            .transport()
            .push_truncated(200, "{\"subject\":\"/s\",\"type\":\"t\"}\n");

        let err = client.stream_events("/s").unwrap_err();
        assert!(err.is_transport(), "got {err:?}");
    }

    #[test]
    fn commit_generates_exactly_the_missing_ids() {
        let client = test_client();
        client.transport().push_response(200, "");

        let batch = vec![
            Event::new("/user/1", "added", json!({"n": 1})).with_id("caller-id"),
            Event::new("/user/1", "updated", json!({"n": 2})),
        ];
        let committed = client.commit_events(batch).unwrap();

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.url, "https://es.example.com/api/v1/commit");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Accept"), None);

        let body = sent_body(&request);
        let sent = body["events"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["id"], "caller-id");

        let generated = sent[1]["id"].as_str().unwrap();
        assert!(!generated.is_empty());
        assert_ne!(generated, "caller-id");
        assert_eq!(committed[1].id, generated);

        for event in sent {
            assert_eq!(event["source"], "https://es.example.com/");
            assert_eq!(event["datacontenttype"], "application/json");
            assert_eq!(event["specversion"], "1.0");
            assert!(event["time"].is_string());
        }
    }

    #[test]
    fn commit_surfaces_rejection() {
        let client = test_client();
        client.transport().push_response(409, "version conflict");

        let err = client
            .commit_events(vec![Event::new("/user/1", "added", json!({}))])
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "API error: 409 - version conflict");
    }

    #[test]
    fn query_rows_are_not_normalized() {
        let client = test_client();
        client
            .transport()
            .push_response(200, "{\"subject\":\"/s\"}\n\n42\n");

        let rows = client.query("FROM e IN events PROJECT INTO e").unwrap();
        assert_eq!(rows, vec![json!({"subject": "/s"}), json!(42)]);

        let request = client.transport().last_request().unwrap();
        assert_eq!(request.url, "https://es.example.com/api/v1/q");
        assert_eq!(request.header("Accept"), Some("application/x-ndjson"));
        assert_eq!(
            sent_body(&request),
            json!({"query": "FROM e IN events PROJECT INTO e"})
        );
    }

    #[test]
    fn ping_and_audit_return_body_verbatim() {
        let client = test_client();
        client.transport().push_response(200, "  pong\n");
        client.transport().push_response(200, "{\"ok\": true}\r\n");

        assert_eq!(client.ping().unwrap(), "  pong\n");
        assert_eq!(client.audit().unwrap(), "{\"ok\": true}\r\n");

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "https://es.example.com/api/v1/status/ping");
        assert_eq!(requests[1].url, "https://es.example.com/api/v1/status/audit");
        for request in &requests {
            assert_eq!(request.body, None);
            assert_eq!(request.header("Content-Type"), None);
            assert_eq!(request.header("Accept"), None);
            assert_eq!(request.header("Authorization"), Some("Bearer secret-token"));
        }
    }

    #[test]
    fn every_endpoint_reports_non_200_as_api_error() {
        let client = test_client();
        for _ in 0..5 {
            client.transport().push_response(503, "maintenance");
        }

        let errors = [
            client.stream_events("/s").unwrap_err(),
            client.commit_events(Vec::new()).unwrap_err(),
            client.query("q").unwrap_err(),
            client.ping().unwrap_err(),
            client.audit().unwrap_err(),
        ];
        for err in errors {
            match err {
                ClientError::Api { status, body } => {
                    assert_eq!(status, 503);
                    assert_eq!(body, "maintenance");
                }
                other => panic!("expected API error, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_200_success_codes_are_rejected() {
        let client = test_client();
        client.transport().push_response(204, "");
        assert_eq!(client.ping().unwrap_err().status(), Some(204));
    }

    #[test]
    fn unreachable_server_is_a_transport_error_and_client_stays_usable() {
        let client = test_client();
        client.transport().push_unreachable("connection refused");
        client.transport().push_response(200, "pong");

        assert!(client.ping().unwrap_err().is_transport());
        assert_eq!(client.ping().unwrap(), "pong");
    }
}
