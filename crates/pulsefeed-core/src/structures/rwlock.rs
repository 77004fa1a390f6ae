//! Many-reader / single-writer lock layered on [`Semaphore`].
//!
//! Two-semaphore design: a writer semaphore of capacity one serializes
//! writers, and a reader semaphore of capacity
//! [`MAX_CONCURRENT_READERS`] admits readers. A writer first takes the
//! writer slot and then drains every reader permit, so a writer excludes
//! readers as well as other writers; holding the writer slot while
//! draining keeps two writers from deadlocking on partial permit sets.
//!
//! Reader concurrency is capped at the permit count. Not reentrant: a
//! thread that already holds a guard must not acquire another one.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};

use crate::constants::MAX_CONCURRENT_READERS;
use crate::structures::semaphore::Semaphore;

/// Reader/writer lock owning the value it guards.
pub struct RwLock<T> {
    writer: Semaphore,
    readers: Semaphore,
    value: UnsafeCell<T>,
}

// Shared references hand out &T from several threads at once, so T must
// be Sync; the write guard can move the value out through &mut, so Send.
unsafe impl<T: Send> Send for RwLock<T> {}
unsafe impl<T: Send + Sync> Sync for RwLock<T> {}

impl<T> RwLock<T> {
    /// Create a lock around `value`.
    pub fn new(value: T) -> Self {
        Self {
            writer: Semaphore::new(1),
            readers: Semaphore::new(MAX_CONCURRENT_READERS),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquire shared access. Blocks while a writer holds the lock or
    /// the reader cap is reached.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.readers.down();
        RwLockReadGuard { lock: self }
    }

    /// Acquire exclusive access. Blocks until every reader and writer
    /// has left.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.writer.down();
        for _ in 0..MAX_CONCURRENT_READERS {
            self.readers.down();
        }
        RwLockWriteGuard { lock: self }
    }
}

/// Shared guard; returns its reader permit on drop.
pub struct RwLockReadGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for RwLockReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        // Readers only ever reach &T; writers are drained out.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> Drop for RwLockReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.readers.up();
    }
}

/// Exclusive guard; restores the reader permits and the writer slot on drop.
pub struct RwLockWriteGuard<'a, T> {
    lock: &'a RwLock<T>,
}

impl<T> Deref for RwLockWriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for RwLockWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Exclusive: the writer slot is held and all reader permits drained.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for RwLockWriteGuard<'_, T> {
    fn drop(&mut self) {
        for _ in 0..MAX_CONCURRENT_READERS {
            self.lock.readers.up();
        }
        self.lock.writer.up();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn writers_are_mutually_exclusive() {
        let lock = Arc::new(RwLock::new(0u64));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..1_000 {
                    *lock.write() += 1;
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*lock.read(), 8_000);
    }

    #[test]
    fn readers_run_concurrently() {
        let readers = 8;
        let lock = Arc::new(RwLock::new(()));
        let barrier = Arc::new(Barrier::new(readers));

        // Every thread holds its read guard across the barrier; if readers
        // excluded each other this would deadlock instead of joining.
        let mut handles = Vec::new();
        for _ in 0..readers {
            let lock = Arc::clone(&lock);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                let _guard = lock.read();
                barrier.wait();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn writer_excludes_readers() {
        let lock = Arc::new(RwLock::new(0u64));
        let (tx, rx) = mpsc::channel();

        let write_guard = lock.write();
        let reader = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let value = *lock.read();
                tx.send(value).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(write_guard);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        reader.join().unwrap();
    }

    #[test]
    fn reader_excludes_writer() {
        let lock = Arc::new(RwLock::new(0u64));
        let (tx, rx) = mpsc::channel();

        let read_guard = lock.read();
        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                *lock.write() = 1;
                tx.send(()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(read_guard);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        writer.join().unwrap();
        assert_eq!(*lock.read(), 1);
    }

    #[test]
    fn reader_concurrency_is_capped() {
        let lock = Arc::new(RwLock::new(()));
        let (tx, rx) = mpsc::channel();

        let guards: Vec<_> = (0..MAX_CONCURRENT_READERS).map(|_| lock.read()).collect();

        let extra = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.read();
                tx.send(()).unwrap();
            })
        };

        // Permit pool exhausted: one more reader has to wait.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guards);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        extra.join().unwrap();
    }

    #[test]
    fn mixed_load_keeps_counter_consistent() {
        let lock = Arc::new(RwLock::new(0i64));
        let reads_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for worker in 0..8 {
            let lock = Arc::clone(&lock);
            let reads_seen = Arc::clone(&reads_seen);
            handles.push(thread::spawn(move || {
                for i in 0..500 {
                    if (worker + i) % 4 == 0 {
                        *lock.write() += 1;
                    } else {
                        // A torn read would show a value outside [0, total writes].
                        let value = *lock.read();
                        assert!((0..=1_000).contains(&value));
                        reads_seen.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(reads_seen.load(Ordering::Relaxed) > 0);
        assert_eq!(*lock.read(), 1_000);
    }
}
