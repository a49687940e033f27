//! `eventstore-core`: configuration and error model shared by the client crates.
//!
//! This crate has **no transport concerns**; it only describes what a client
//! needs to know about the remote store and how calls can fail.

pub mod config;
pub mod error;

pub use config::{Config, ENV_API_URL, ENV_API_VERSION, ENV_AUTH_TOKEN};
pub use error::{BoxError, ClientError, ClientResult, ConfigError};
