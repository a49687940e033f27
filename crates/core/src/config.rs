//! Client configuration.

use crate::error::ConfigError;

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "EVENTSTORE_API_URL";
/// Environment variable holding the API version path segment (e.g. `v1`).
pub const ENV_API_VERSION: &str = "EVENTSTORE_API_VERSION";
/// Environment variable holding the bearer token.
pub const ENV_AUTH_TOKEN: &str = "EVENTSTORE_AUTH_TOKEN";

/// Connection settings for a remote event store.
///
/// Immutable after construction; all three values are mandatory.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_url: String,
    api_version: String,
    auth_token: String,
}

impl Config {
    /// Build a configuration, rejecting the first empty value
    /// (checked in order: URL, version, token).
    pub fn new(
        api_url: impl Into<String>,
        api_version: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let api_url = api_url.into();
        let api_version = api_version.into();
        let auth_token = auth_token.into();

        if api_url.is_empty() {
            return Err(ConfigError::Missing("api_url"));
        }
        if api_version.is_empty() {
            return Err(ConfigError::Missing("api_version"));
        }
        if auth_token.is_empty() {
            return Err(ConfigError::Missing("auth_token"));
        }

        Ok(Self {
            api_url,
            api_version,
            auth_token,
        })
    }

    /// Read `EVENTSTORE_API_URL`, `EVENTSTORE_API_VERSION` and
    /// `EVENTSTORE_AUTH_TOKEN` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], with a caller-supplied variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_default()
        };

        Self::new(read(ENV_API_URL), read(ENV_API_VERSION), read(ENV_AUTH_TOKEN))
    }

    /// Base URL exactly as configured (used as the default event `source`).
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// `{api_url without trailing slashes}/api/{api_version}{path}`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}{}",
            self.api_url.trim_end_matches('/'),
            self.api_version,
            path
        )
    }
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}
