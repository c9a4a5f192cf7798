//! Rayon thread pool sizing for sweeps.

use rayon::ThreadPoolBuilder;
use tracing::warn;

/// Worker count for parallel sweeps. Zero means the global rayon pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Threads the sweep will actually run on.
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }

    /// Run `f` inside a dedicated pool of `workers` threads. If the pool cannot be
    /// built, `f` runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(workers = self.workers, error = %err, "falling back to global rayon pool");
                f()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_uses_global_pool() {
        let pool = WorkerPool::default();
        assert_eq!(pool.effective_workers(), rayon::current_num_threads());
        assert_eq!(pool.install(|| 41 + 1), 42);
    }

    #[test]
    fn dedicated_pool_runs_closure() {
        let pool = WorkerPool::with_workers(2);
        assert_eq!(pool.install(rayon::current_num_threads), 2);
    }
}
