//! Client error model.

use thiserror::Error;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used across the client crates.
pub type ClientResult<T> = Result<T, ClientError>;

/// A mandatory configuration value was missing at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Failure of a single client call.
///
/// Every variant is returned to the caller as-is: the client performs no
/// retries and no silent recovery. A failed call never poisons the client;
/// the next call starts from a clean slate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mandatory configuration value is missing.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The request could not be built (e.g. body serialization failed).
    #[error("error creating request: {0}")]
    RequestBuild(String),

    /// The server could not be reached, or reading its response failed.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// A line of a newline-delimited JSON body is not valid JSON.
    #[error("error parsing JSON line {line:?}: {source}")]
    Decode {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn request_build(msg: impl Into<String>) -> Self {
        Self::RequestBuild(msg.into())
    }

    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }

    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    pub fn decode(line: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            line: line.into(),
            source,
        }
    }

    /// Network-level failure; the only kind where re-issuing the call may help.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
