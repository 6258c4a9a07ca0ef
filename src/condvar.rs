/*!
 * Condition Variable
 *
 * Generation-counter wakeup built on one wait/wake cell, paired with a
 * caller-supplied [`Mutex`].
 *
 * # Design
 *
 * The only state is a monotonically increasing `trigger` counter. `wait`
 * snapshots it while the lock is still held, releases the lock, then
 * parks until the counter moves past the snapshot. A notification that
 * lands between the unlock and the park is therefore never lost: the
 * changed counter fails the park's validate check and `wait` returns at
 * once. Spurious wakeups are allowed; callers must loop on their
 * predicate while holding the lock (monitor discipline):
 *
 * ```
 * use synckit::{CondVar, Mutex};
 *
 * let ready = Mutex::new(false);
 * let cv = CondVar::new();
 *
 * let mut state = ready.lock();
 * # *state = true;
 * while !*state {
 *     state = cv.wait(state);
 * }
 * ```
 */

use crate::cell::WaitCell;
use crate::mutex::MutexGuard;

/// Condition variable for use with [`Mutex`](crate::Mutex)
///
/// Tracks no predicate and no particular mutex; pairing is the caller's
/// responsibility, as with any monitor.
pub struct CondVar {
    trigger: WaitCell,
}

impl CondVar {
    /// Create a new condition variable
    pub const fn new() -> Self {
        Self {
            trigger: WaitCell::new(0),
        }
    }

    /// Atomically release the guard's lock and block until notified
    ///
    /// Reacquires the lock before returning. May return spuriously, so
    /// callers re-check their predicate in a loop.
    pub fn wait<'a, T: ?Sized>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let snapshot = self.trigger.load();
        let mutex = MutexGuard::mutex(&guard);
        drop(guard); // unlock
        self.trigger.wait(snapshot);
        mutex.lock()
    }

    /// Wake one waiting thread
    pub fn notify_one(&self) {
        self.trigger.fetch_add(1);
        self.trigger.wake_one();
    }

    /// Wake all waiting threads
    pub fn notify_all(&self) {
        self.trigger.fetch_add(1);
        self.trigger.wake_all();
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CondVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CondVar").finish_non_exhaustive()
    }
}
