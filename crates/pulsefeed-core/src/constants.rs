//! System-wide constants

/// Number of reader permits held by a [`RwLock`](crate::structures::RwLock).
/// A writer drains every permit, so this is also the reader concurrency cap.
pub const MAX_CONCURRENT_READERS: usize = 32;
