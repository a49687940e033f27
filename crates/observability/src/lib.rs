//! Shared tracing setup for event store binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is left to the process that owns `main`.

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, ParseLogFormatError};

/// Initialize process-wide logging at the default level (`warn`, or
/// `RUST_LOG` when set). [`LogFormat::Json`] is the default format.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format, tracing::DEFAULT_DIRECTIVE);
}
