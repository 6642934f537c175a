//! Monitoring capabilities a thread pool may expose.
//!
//! Capabilities form a small closed hierarchy:
//!
//! ```text
//! ThreadPool            threads(), idle_threads()
//!   └── SizedThreadPool     min_threads(), max_threads()
//!         └── QueuedThreadPool  busy_threads()
//! ```
//!
//! A pool advertises the richer views by overriding [`ThreadPool::as_sized`]
//! and [`SizedThreadPool::as_queued`]. The queued view is only reachable
//! through the sized one, so a queue-backed pool without configured bounds
//! cannot be expressed.

/// Base capability: every pool can report its total and idle thread counts.
pub trait ThreadPool: Send + Sync {
    /// Total number of threads currently in the pool.
    fn threads(&self) -> usize;

    /// Number of threads currently idle.
    fn idle_threads(&self) -> usize;

    /// View this pool as a bounded pool, if it has configured limits.
    fn as_sized(&self) -> Option<&dyn SizedThreadPool> {
        None
    }
}

/// Bounded capability: the pool has configured minimum and maximum sizes.
pub trait SizedThreadPool: ThreadPool {
    /// Configured minimum number of threads.
    fn min_threads(&self) -> usize;

    /// Configured maximum number of threads.
    fn max_threads(&self) -> usize;

    /// View this pool as queue-backed, if it tracks busy threads.
    fn as_queued(&self) -> Option<&dyn QueuedThreadPool> {
        None
    }
}

/// Queue-backed capability: the pool tracks threads executing work.
pub trait QueuedThreadPool: SizedThreadPool {
    /// Number of threads currently running a job.
    fn busy_threads(&self) -> usize;
}
