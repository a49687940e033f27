//! Lazy result sequences returned by the streaming endpoints.

use std::io::{BufReader, Read};
use std::iter::FusedIterator;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use eventstore_core::{ClientResult, Config};
use eventstore_events::{Event, NdjsonDecoder, normalize};

type Body = BufReader<Box<dyn Read + Send>>;

/// Events of a subject, normalized as they are read.
///
/// Owns the response body; dropping the stream closes the connection.
#[derive(Debug)]
pub struct EventStream {
    decoder: NdjsonDecoder<Body, Event>,
    config: Arc<Config>,
}

impl EventStream {
    pub(crate) fn new(body: Box<dyn Read + Send>, config: Arc<Config>) -> Self {
        Self {
            decoder: NdjsonDecoder::from_reader(body),
            config,
        }
    }

    /// Number of events yielded so far.
    pub fn decoded(&self) -> usize {
        self.decoder.decoded()
    }
}

impl Iterator for EventStream {
    type Item = ClientResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder
            .next()
            .map(|item| item.map(|event| normalize(event, &self.config)))
    }
}

impl FusedIterator for EventStream {}

/// Raw query result rows; no normalization is applied.
#[derive(Debug)]
pub struct QueryStream {
    decoder: NdjsonDecoder<Body, JsonValue>,
}

impl QueryStream {
    pub(crate) fn new(body: Box<dyn Read + Send>) -> Self {
        Self {
            decoder: NdjsonDecoder::from_reader(body),
        }
    }

    pub fn decoded(&self) -> usize {
        self.decoder.decoded()
    }
}

impl Iterator for QueryStream {
    type Item = ClientResult<JsonValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next()
    }
}

impl FusedIterator for QueryStream {}
