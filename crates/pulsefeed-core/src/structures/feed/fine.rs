//! Fine-grained feed: hand-over-hand locking with optimistic traversal.
//!
//! Traversal never locks: `next` links are [`ArcSwapOption`] pointers and
//! are read with lock-free loads. Mutations lock only the two nodes
//! around the splice point, `prev` before `curr`, then validate that both
//! are still live and still adjacent; a failed validation releases the
//! locks and restarts from the head. Removal sets the tombstone before
//! unlinking, so a competitor that already reached `curr` observes it as
//! logically gone.
//!
//! Nodes are reference counted: an unlinked node, lock included, stays
//! alive while any traversal still holds an `Arc` to it, so a validator
//! may safely inspect a node that has lost its place in the chain.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::{Acquire, Release};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};

use super::Feed;
use crate::structures::rwlock::RwLock;
use crate::types::PostView;

/// Timestamp of the head sentinel; above any real post.
const HEAD_TS: f64 = f64::INFINITY;
/// Timestamp of the tail sentinel; below any real post.
const TAIL_TS: f64 = f64::NEG_INFINITY;

struct Node {
    timestamp: f64,
    body: ArcSwap<String>,
    /// Tombstone: set under the node's lock, before the node is unlinked.
    removed: AtomicBool,
    /// Per-node lock; `add` and `remove` take the exclusive side only.
    lock: RwLock<()>,
    next: ArcSwapOption<Node>,
}

impl Node {
    fn new(timestamp: f64, body: &str, next: Option<Arc<Node>>) -> Arc<Self> {
        Arc::new(Self {
            timestamp,
            body: ArcSwap::from_pointee(body.to_owned()),
            removed: AtomicBool::new(false),
            lock: RwLock::new(()),
            next: ArcSwapOption::new(next),
        })
    }
}

/// Feed with per-node locks, optimistic traversal and validation.
pub struct FineFeed {
    head: Arc<Node>,
}

impl FineFeed {
    /// Create an empty feed: head and tail sentinels only.
    pub fn new() -> Self {
        let tail = Node::new(TAIL_TS, "", None);
        let head = Node::new(HEAD_TS, "", Some(tail));
        Self { head }
    }

    /// Lock-free walk from the head until `curr.timestamp <= timestamp`.
    ///
    /// Real timestamps are finite, so the walk stops at or before the
    /// tail sentinel and never reads the tail's `next`.
    fn locate(&self, timestamp: f64) -> (Arc<Node>, Arc<Node>) {
        let mut prev = Arc::clone(&self.head);
        let mut curr = prev
            .next
            .load_full()
            .expect("head sentinel always has a successor");
        while curr.timestamp > timestamp {
            let next = curr
                .next
                .load_full()
                .expect("only the tail sentinel ends the chain");
            prev = curr;
            curr = next;
        }
        (prev, curr)
    }
}

impl Default for FineFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Both nodes still live, and still adjacent.
fn validate(prev: &Arc<Node>, curr: &Arc<Node>) -> bool {
    if prev.removed.load(Acquire) || curr.removed.load(Acquire) {
        return false;
    }
    match prev.next.load_full() {
        Some(next) => Arc::ptr_eq(&next, curr),
        None => false,
    }
}

impl Feed for FineFeed {
    fn add(&self, body: &str, timestamp: f64) {
        loop {
            let (prev, curr) = self.locate(timestamp);
            let _prev_lock = prev.lock.write();
            let _curr_lock = curr.lock.write();
            if !validate(&prev, &curr) {
                continue;
            }
            if curr.timestamp == timestamp {
                curr.body.store(Arc::new(body.to_owned()));
            } else {
                // Link the new node forward before exposing it: a reader
                // must never follow a `next` that points backward.
                let node = Node::new(timestamp, body, Some(Arc::clone(&curr)));
                prev.next.store(Some(node));
            }
            return;
        }
    }

    fn remove(&self, timestamp: f64) -> bool {
        loop {
            let (prev, curr) = self.locate(timestamp);
            let _prev_lock = prev.lock.write();
            let _curr_lock = curr.lock.write();
            if !validate(&prev, &curr) {
                continue;
            }
            if curr.timestamp != timestamp {
                return false;
            }
            // Tombstone first, unlink second: a competitor holding `curr`
            // fails validation instead of mutating a dead node.
            curr.removed.store(true, Release);
            prev.next.store(curr.next.load_full());
            return true;
        }
    }

    fn contains(&self, timestamp: f64) -> bool {
        // Wait-free: no locks, no retries.
        let (_, curr) = self.locate(timestamp);
        curr.timestamp == timestamp && !curr.removed.load(Acquire)
    }

    fn show(&self) -> Vec<PostView> {
        let mut posts = Vec::new();
        let mut curr = self
            .head
            .next
            .load_full()
            .expect("head sentinel always has a successor");
        // Stop at the tail sentinel by timestamp; sentinels never appear
        // in a snapshot.
        while curr.timestamp > TAIL_TS {
            if !curr.removed.load(Acquire) {
                posts.push(PostView {
                    body: curr.body.load_full().as_ref().clone(),
                    timestamp: curr.timestamp,
                });
            }
            let next = curr
                .next
                .load_full()
                .expect("only the tail sentinel ends the chain");
            curr = next;
        }
        posts
    }
}

impl Drop for FineFeed {
    fn drop(&mut self) {
        // Sever links iteratively; dropping a long chain must not recurse.
        let mut curr = self.head.next.swap(None);
        while let Some(node) = curr {
            curr = node.next.swap(None);
        }
    }
}
