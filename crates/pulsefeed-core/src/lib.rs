//! # Pulsefeed Core
//!
//! Concurrent building blocks for the pulsefeed server: a counting
//! semaphore, a reader/writer lock layered on it, a lock-free
//! multi-producer/multi-consumer queue, and the timestamp-ordered post
//! feed in two locking flavors.

#![warn(missing_docs)]

/// Reusable concurrent structures
pub mod structures;

/// Type definitions for requests, responses and errors
pub mod types;

/// System constants
pub mod constants;

// Re-export commonly used items
pub use structures::{create_feed, Feed, FeedKind, MsQueue, RwLock, Semaphore};
pub use types::{Command, Error, PostView, Response, Result};
