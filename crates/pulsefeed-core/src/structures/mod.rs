/// Core reusable concurrent structures
pub mod feed;
pub mod queue;
pub mod rwlock;
pub mod semaphore;

// Export the main types
pub use feed::{create_feed, CoarseFeed, Feed, FeedKind, FineFeed};
pub use queue::MsQueue;
pub use rwlock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use semaphore::Semaphore;
