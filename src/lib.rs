//! Pulsefeed - a concurrent timestamp-ordered feed server
//!
//! Pulsefeed reads a stream of self-delimiting JSON commands
//! (ADD / REMOVE / CONTAINS / FEED / DONE), applies them to a single
//! timestamp-ordered feed of posts, and emits one JSON response per
//! command. The interesting part is underneath: the feed, the work queue
//! and the locks are hand-built concurrent structures living in
//! `pulsefeed-core`.
#![warn(missing_docs)]

// Core runtime configuration
pub mod core;

// The request dispatch layer
pub mod server;

// Re-export commonly used items for convenience
pub use crate::core::config::{Config, Mode};
pub use pulsefeed_core::types::error::{Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing output.
///
/// stdout carries the response stream, so all diagnostics go to stderr.
/// `RUST_LOG` takes precedence over the configured default level.
pub fn init(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Initializing {} v{}", NAME, VERSION);
}
