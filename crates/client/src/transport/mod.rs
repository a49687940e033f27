//! HTTP transport boundary.
//!
//! The client only needs one capability from HTTP: send a request and hand
//! back a status plus a readable body. [`Transport`] captures exactly that, so
//! the production [`ReqwestTransport`] can be swapped for
//! [`crate::testing::MockTransport`] (tests) or any other HTTP stack.
//!
//! ## Resource Release
//!
//! [`HttpResponse`] owns the body reader. Dropping the response (on success,
//! decode failure, or transport failure alike) releases the connection.

pub mod http;

pub use http::ReqwestTransport;

use std::io::Read;
use std::sync::Arc;

use eventstore_core::{ClientError, ClientResult};

/// HTTP methods used by the event store API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl core::fmt::Display for Method {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully built request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// First value of a header (case-insensitive name match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and streaming body of an HTTP exchange.
pub struct HttpResponse {
    status: u16,
    body: Box<dyn Read + Send>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Hand over the body for incremental reading.
    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }

    /// Read the whole body as text, byte-for-byte (invalid UTF-8 is replaced).
    pub fn into_text(mut self) -> ClientResult<String> {
        let mut bytes = Vec::new();
        self.body
            .read_to_end(&mut bytes)
            .map_err(ClientError::transport)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        })
    }
}

impl core::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Performs one HTTP exchange per call.
///
/// Implementations must be safe to share across threads; the client adds no
/// synchronization of its own. Timeouts, TLS and connection pooling are the
/// implementation's concern.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse>;
}

impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        (**self).send(request)
    }
}

impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        (**self).send(request)
    }
}
