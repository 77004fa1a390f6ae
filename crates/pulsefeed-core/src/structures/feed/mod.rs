//! Timestamp-ordered post feed.
//!
//! Posts are kept in a singly-linked chain with strictly decreasing
//! timestamps, most-recent-first. Two interchangeable implementations:
//! [`CoarseFeed`] serializes everything under one feed-wide reader/writer
//! lock, [`FineFeed`] locks only the two nodes around a splice point and
//! traverses without locks.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::PostView;

mod coarse;
mod fine;

pub use coarse::CoarseFeed;
pub use fine::FineFeed;

/// A timestamp-ordered collection of posts.
///
/// Adding an already-present timestamp replaces that post's body instead
/// of creating a second node.
pub trait Feed: Send + Sync {
    /// Insert a post, keeping the chain ordered most-recent-first. If a
    /// post with the same timestamp exists, its body is replaced.
    fn add(&self, body: &str, timestamp: f64);

    /// Remove the post with exactly `timestamp`; returns whether a post
    /// was removed.
    fn remove(&self, timestamp: f64) -> bool;

    /// Whether a live post with exactly `timestamp` exists.
    fn contains(&self, timestamp: f64) -> bool;

    /// Snapshot of the feed, most-recent-first.
    fn show(&self) -> Vec<PostView>;
}

/// Available feed locking strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// One feed-wide reader/writer lock
    Coarse,
    /// Per-node locks with optimistic traversal
    Fine,
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coarse" => Ok(FeedKind::Coarse),
            "fine" => Ok(FeedKind::Fine),
            other => Err(format!(
                "unknown feed kind: {other}. Valid options: coarse, fine"
            )),
        }
    }
}

/// Create a feed with the given locking strategy.
pub fn create_feed(kind: FeedKind) -> Arc<dyn Feed> {
    match kind {
        FeedKind::Coarse => Arc::new(CoarseFeed::new()),
        FeedKind::Fine => Arc::new(FineFeed::new()),
    }
}
