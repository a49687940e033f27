//! Scripted transport for tests.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{Mutex, MutexGuard};

use eventstore_core::{ClientError, ClientResult};

use crate::transport::{HttpRequest, HttpResponse, Transport};

type Scripted = Result<HttpResponse, String>;

/// In-memory [`Transport`] that records requests and replays canned responses
/// in FIFO order.
///
/// Intended for tests/dev. A call with no response left fails with a
/// transport error.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete response.
    pub fn push_response(&self, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.push_reader(status, io::Cursor::new(body.into()))
    }

    /// Queue a response streaming from an arbitrary reader.
    pub fn push_reader(&self, status: u16, body: impl Read + Send + 'static) -> &Self {
        lock(&self.script).push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a response whose body breaks after `head` bytes.
    pub fn push_truncated(&self, status: u16, head: impl Into<Vec<u8>>) -> &Self {
        self.push_reader(
            status,
            TruncatedBody {
                head: io::Cursor::new(head.into()),
            },
        )
    }

    /// Queue a connection failure.
    pub fn push_unreachable(&self, message: impl Into<String>) -> &Self {
        lock(&self.script).push_back(Err(message.into()));
        self
    }

    /// Every request sent so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        lock(&self.requests).push(request);

        match lock(&self.script).pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ClientError::transport(message)),
            None => Err(ClientError::transport("mock transport has no scripted response")),
        }
    }
}

/// Serves its head, then fails like a dropped connection.
struct TruncatedBody {
    head: io::Cursor<Vec<u8>>,
}

impl Read for TruncatedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.head.read(buf)? {
            0 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of body",
            )),
            n => Ok(n),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
