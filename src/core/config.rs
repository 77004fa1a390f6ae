//! Configuration for the pulsefeed server
//!
//! Configuration comes from an optional TOML file with CLI overrides
//! applied on top; every field has a sensible default.

use serde::{Deserialize, Serialize};

use pulsefeed_core::structures::feed::FeedKind;
use pulsefeed_core::types::error::{Error, Result};

/// Execution mode for the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Process each request on the calling thread
    Sequential,
    /// One producer plus a pool of consumer threads
    Parallel,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Execution mode
    pub mode: Mode,

    /// Number of consumer threads (parallel mode only)
    pub consumers: usize,

    /// Feed locking strategy
    pub feed: FeedKind,

    /// Default log level when RUST_LOG is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Sequential,
            consumers: 0,
            feed: FeedKind::Coarse,
            log_level: "info".to_owned(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &str) -> Result<Config> {
    let config_str = std::fs::read_to_string(path)?;
    let config = toml::from_str(&config_str)
        .map_err(|e| Error::config(format!("invalid config file {path}: {e}")))?;
    Ok(config)
}

/// Load configuration from file or use defaults
pub fn load_config_or_default(path: Option<&str>) -> Config {
    match path {
        Some(path) => match load_config(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}. Using defaults.", path, e);
                Config::default()
            }
        },
        None => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_and_coarse() {
        let config = Config::default();
        assert_eq!(config.mode, Mode::Sequential);
        assert_eq!(config.consumers, 0);
        assert_eq!(config.feed, FeedKind::Coarse);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("mode = \"parallel\"\nconsumers = 4\n").unwrap();
        assert_eq!(config.mode, Mode::Parallel);
        assert_eq!(config.consumers, 4);
        assert_eq!(config.feed, FeedKind::Coarse);
    }

    #[test]
    fn feed_kind_round_trips_through_toml() {
        let config: Config = toml::from_str("feed = \"fine\"").unwrap();
        assert_eq!(config.feed, FeedKind::Fine);
    }
}
