//! Unbounded multi-producer / multi-consumer FIFO (Michael–Scott).
//!
//! A permanently-present dummy node removes the empty-vs-nonempty special
//! case: `head` always points at the dummy, `head.next` is the oldest live
//! cell, and `tail` points at the dummy or some later node, possibly one
//! step behind the true last cell. Dequeue promotes the successor to new
//! dummy and retires the old one.
//!
//! Retired dummies are reclaimed through `crossbeam_epoch`: a node is
//! freed only after every thread pinned at retirement time has unpinned,
//! so a compare-and-swap still holding the old pointer can never observe
//! a recycled address (ABA).

use std::mem::MaybeUninit;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};

struct Node<T> {
    /// Uninitialized in the dummy; moved out exactly once, by the
    /// dequeuer that promotes this node to dummy.
    data: MaybeUninit<T>,
    next: Atomic<Node<T>>,
}

/// Unbounded lock-free FIFO.
pub struct MsQueue<T> {
    head: Atomic<Node<T>>,
    tail: Atomic<Node<T>>,
}

unsafe impl<T: Send> Send for MsQueue<T> {}
unsafe impl<T: Send> Sync for MsQueue<T> {}

impl<T> MsQueue<T> {
    /// Create an empty queue holding only the dummy node.
    pub fn new() -> Self {
        let queue = Self {
            head: Atomic::null(),
            tail: Atomic::null(),
        };
        // Not yet shared with any other thread.
        unsafe {
            let guard = epoch::unprotected();
            let dummy = Owned::new(Node {
                data: MaybeUninit::uninit(),
                next: Atomic::null(),
            })
            .into_shared(guard);
            queue.head.store(dummy, Relaxed);
            queue.tail.store(dummy, Relaxed);
        }
        queue
    }

    /// Append `value` at the tail. Never blocks; spins on CAS failure.
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();
        let mut node = Owned::new(Node {
            data: MaybeUninit::new(value),
            next: Atomic::null(),
        });
        loop {
            let tail = self.tail.load(Acquire, guard);
            // The tail is never null: the dummy is permanent.
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Acquire, guard);
            // Snapshot consistency: start over if the tail moved under us.
            if tail != self.tail.load(Acquire, guard) {
                continue;
            }
            if next.is_null() {
                match tail_ref
                    .next
                    .compare_exchange(Shared::null(), node, Release, Relaxed, guard)
                {
                    Ok(appended) => {
                        // Helper step: losing this CAS just means another
                        // thread already swung the tail forward.
                        let _ = self
                            .tail
                            .compare_exchange(tail, appended, Release, Relaxed, guard);
                        return;
                    }
                    Err(error) => node = error.new,
                }
            } else {
                // The tail is lagging; help it forward and retry.
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Release, Relaxed, guard);
            }
        }
    }

    /// Remove the oldest value, or `None` when the queue is empty.
    /// Never blocks.
    pub fn dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();
        loop {
            let head = self.head.load(Acquire, guard);
            let tail = self.tail.load(Acquire, guard);
            let head_ref = unsafe { head.deref() };
            let next = head_ref.next.load(Acquire, guard);
            if head != self.head.load(Acquire, guard) {
                continue;
            }
            if head == tail {
                if next.is_null() {
                    return None;
                }
                // A half-finished enqueue left the tail behind.
                let _ = self
                    .tail
                    .compare_exchange(tail, next, Release, Relaxed, guard);
                continue;
            }
            // head != tail, so the successor exists.
            let next_ref = unsafe { next.deref() };
            if self
                .head
                .compare_exchange(head, next, Release, Relaxed, guard)
                .is_ok()
            {
                // `next` is the new dummy; this CAS won, so only this
                // thread moves its value out.
                let value = unsafe { next_ref.data.as_ptr().read() };
                // The old dummy becomes unreachable once every thread
                // pinned right now has unpinned.
                unsafe { guard.defer_destroy(head) };
                return Some(value);
            }
        }
    }
}

impl<T> Default for MsQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for MsQueue<T> {
    fn drop(&mut self) {
        // &mut self: no other thread can touch the queue anymore.
        unsafe {
            let guard = epoch::unprotected();
            let mut curr = self.head.load(Relaxed, guard);
            let mut is_dummy = true;
            while !curr.is_null() {
                let next = curr.deref().next.load(Relaxed, guard);
                let mut node = curr.into_owned();
                if !is_dummy {
                    node.data.assume_init_drop();
                }
                is_dummy = false;
                drop(node);
                curr = next;
            }
        }
    }
}
