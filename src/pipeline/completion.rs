//! Counting barrier for in-flight files.
//!
//! The feeder takes one [`PendingToken`] per filename before queueing it. The token travels
//! with the file through the reader and hasher; dropping it marks the file complete, so
//! every exit path (success, open failure, read or hash failure) decrements exactly once.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct CompletionBarrier {
    pending: Mutex<usize>,
    cv: Condvar,
}

impl CompletionBarrier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one more unit of work.
    pub fn add(self: &Arc<Self>) -> PendingToken {
        *self.lock() += 1;
        PendingToken {
            barrier: Arc::clone(self),
        }
    }

    /// Current count. A snapshot; may be stale.
    pub fn pending(&self) -> usize {
        *self.lock()
    }

    /// Block until every token has been dropped.
    pub fn wait(&self) {
        let mut n = self.lock();
        while *n > 0 {
            n = self.cv.wait(n).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn done(&self) {
        let mut n = self.lock();
        debug_assert!(*n > 0, "CompletionBarrier decremented below zero");
        *n = n.saturating_sub(1);
        if *n == 0 {
            self.cv.notify_all();
        }
    }
}

/// One unit of outstanding work; completes on drop.
#[derive(Debug)]
#[must_use = "dropping the token marks the work complete"]
pub struct PendingToken {
    barrier: Arc<CompletionBarrier>,
}

impl Drop for PendingToken {
    fn drop(&mut self) {
        self.barrier.done();
    }
}
