use std::time::Duration;

use eventstore_core::{ClientError, ClientResult};

use super::{HttpRequest, HttpResponse, Method, Transport};

/// Blocking `reqwest` transport.
///
/// No request timeout is set by default: stream and query responses are read
/// until the server closes them. Use [`ReqwestTransport::with_timeout`] to
/// impose a deadline on the whole exchange.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> ClientResult<Self> {
        Self::with_timeout(None::<Duration>)
    }

    pub fn with_timeout(timeout: impl Into<Option<Duration>>) -> ClientResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout.into())
            .build()
            .map_err(ClientError::transport)?;
        Ok(Self { client })
    }

    /// Reuse an already configured client (proxies, TLS roots, pools, ...).
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(|err| {
            if err.is_builder() {
                ClientError::request_build(err.to_string())
            } else {
                ClientError::transport(err)
            }
        })?;

        Ok(HttpResponse::new(response.status().as_u16(), response))
    }
}
