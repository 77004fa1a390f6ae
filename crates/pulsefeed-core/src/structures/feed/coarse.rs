//! Coarse-grained feed: one reader/writer lock over the whole chain.
//!
//! `add` and `remove` enter as the writer, `contains` and `show` as
//! readers. Correct by construction given a correct lock; traversal is
//! plain sequential pointer-chasing.

use super::Feed;
use crate::structures::rwlock::RwLock;
use crate::types::PostView;

struct Post {
    body: String,
    timestamp: f64,
    next: Option<Box<Post>>,
}

/// Feed guarded by a single [`RwLock`].
pub struct CoarseFeed {
    start: RwLock<Option<Box<Post>>>,
}

impl CoarseFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self {
            start: RwLock::new(None),
        }
    }
}

impl Default for CoarseFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed for CoarseFeed {
    fn add(&self, body: &str, timestamp: f64) {
        let mut guard = self.start.write();
        let mut slot = &mut *guard;
        while slot.as_ref().map_or(false, |post| post.timestamp > timestamp) {
            slot = &mut slot.as_mut().unwrap().next;
        }
        if let Some(post) = slot.as_deref_mut() {
            if post.timestamp == timestamp {
                post.body = body.to_owned();
                return;
            }
        }
        let next = slot.take();
        *slot = Some(Box::new(Post {
            body: body.to_owned(),
            timestamp,
            next,
        }));
    }

    fn remove(&self, timestamp: f64) -> bool {
        let mut guard = self.start.write();
        let mut slot = &mut *guard;
        while slot.as_ref().map_or(false, |post| post.timestamp > timestamp) {
            slot = &mut slot.as_mut().unwrap().next;
        }
        match slot.take() {
            Some(post) if post.timestamp == timestamp => {
                *slot = post.next;
                true
            }
            kept => {
                *slot = kept;
                false
            }
        }
    }

    fn contains(&self, timestamp: f64) -> bool {
        let guard = self.start.read();
        let mut curr = guard.as_deref();
        while let Some(post) = curr {
            if post.timestamp == timestamp {
                return true;
            }
            // Strictly decreasing order: no match possible past this point.
            if post.timestamp < timestamp {
                return false;
            }
            curr = post.next.as_deref();
        }
        false
    }

    fn show(&self) -> Vec<PostView> {
        let guard = self.start.read();
        let mut posts = Vec::new();
        let mut curr = guard.as_deref();
        while let Some(post) = curr {
            posts.push(PostView {
                body: post.body.clone(),
                timestamp: post.timestamp,
            });
            curr = post.next.as_deref();
        }
        posts
    }
}

impl Drop for CoarseFeed {
    fn drop(&mut self) {
        // Unlink iteratively; dropping a long chain must not recurse.
        let mut curr = self.start.write().take();
        while let Some(mut post) = curr {
            curr = post.next.take();
        }
    }
}
