/*!
 * Zero-Wait Counter
 *
 * Up/down counter whose `wait` blocks until the count returns to zero.
 * The thread pool uses it to observe "no task is queued or executing"
 * without polling.
 */

use crate::condvar::CondVar;
use crate::mutex::Mutex;

/// Blocking counter: `wait` parks while the count is above zero
#[derive(Default)]
pub struct ZeroWaitCounter {
    count: Mutex<usize>,
    is_zero: CondVar,
}

impl ZeroWaitCounter {
    /// Create a counter at zero
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(0),
            is_zero: CondVar::new(),
        }
    }

    /// Increment the count
    pub fn inc(&self) {
        *self.count.lock() += 1;
    }

    /// Decrement the count, waking all waiters when it reaches zero
    ///
    /// Decrementing a counter already at zero is a usage error.
    pub fn dec(&self) {
        let mut count = self.count.lock();
        debug_assert!(*count > 0, "zero-wait counter decremented below zero");
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.is_zero.notify_all();
        }
    }

    /// Block until the count is zero
    ///
    /// Point-in-time guarantee only: increments after `wait` returns are
    /// not prevented.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            count = self.is_zero.wait(count);
        }
    }
}

impl std::fmt::Debug for ZeroWaitCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeroWaitCounter").finish_non_exhaustive()
    }
}
