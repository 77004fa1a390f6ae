//! Core application components

/// Runtime configuration
pub mod config;

pub use config::{Config, Mode};
