//! Counting semaphore built from a mutex and a condition variable.
//!
//! `down` re-checks the capacity predicate after every wake, so spurious
//! wakeups are harmless. `up` signals while still holding the mutex, which
//! guarantees the woken waiter observes the increment.
//!
//! No fairness guarantee: a waiter may be overtaken by a later `down`
//! that finds capacity available. Starvation-freedom relies on the
//! scheduler.

use std::sync::{Condvar, Mutex};

/// Counting semaphore with a non-negative capacity.
pub struct Semaphore {
    capacity: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore with the given initial capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: Mutex::new(capacity),
            available: Condvar::new(),
        }
    }

    /// Block until a unit of capacity is available, then take it.
    pub fn down(&self) {
        let mut capacity = self.capacity.lock().unwrap();
        while *capacity == 0 {
            capacity = self.available.wait(capacity).unwrap();
        }
        *capacity -= 1;
    }

    /// Return a unit of capacity and wake one waiter.
    pub fn up(&self) {
        let mut capacity = self.capacity.lock().unwrap();
        *capacity += 1;
        self.available.notify_one();
    }
}
