/*!
 * Wait/Wake Cell
 *
 * A futex-style primitive: one atomic u32 that threads can block on until
 * its value changes, plus explicit wake of parked threads.
 *
 * # Design
 *
 * Uses parking_lot_core for futex-like operations on all platforms.
 * On Linux, this maps directly to futex syscalls for minimal overhead.
 * Each cell parks on its own address, so the cell itself is the futex
 * word - no keyed hash table is needed. The validate callback re-checks
 * the expected value under the parking lot's bucket lock, which closes
 * the window between a caller's load and the actual sleep (no missed
 * wakeups, spurious wakeups are acceptable).
 */

use parking_lot_core::{park, unpark_all, unpark_one, ParkResult, ParkToken, UnparkToken};
use std::sync::atomic::{AtomicU32, Ordering};

/// Result of a wake operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Successfully woke N waiters (N >= 1)
    Woken(usize),
    /// No waiters were parked on the cell
    NoWaiters,
}

impl WakeResult {
    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Atomic u32 with blocking wait-for-change and explicit wake
///
/// The value is opaque to this type; higher-level primitives use it as a
/// lock word, a generation counter, or a ready flag.
///
/// # Examples
///
/// ```
/// use synckit::cell::WaitCell;
/// use std::sync::Arc;
/// use std::thread;
///
/// let cell = Arc::new(WaitCell::new(0));
/// let waiter = {
///     let cell = cell.clone();
///     thread::spawn(move || {
///         while cell.load() == 0 {
///             cell.wait(0);
///         }
///     })
/// };
///
/// cell.store(1);
/// cell.wake_one();
/// waiter.join().unwrap();
/// ```
#[repr(C, align(64))] // Cache-line aligned to prevent false sharing
pub struct WaitCell {
    value: AtomicU32,
}

impl WaitCell {
    /// Create a cell holding `value`
    pub const fn new(value: u32) -> Self {
        Self {
            value: AtomicU32::new(value),
        }
    }

    /// Parking key: the cell's own address (stable while any `&self` exists)
    #[inline(always)]
    fn key(&self) -> usize {
        &self.value as *const AtomicU32 as usize
    }

    /// Load the current value
    #[inline(always)]
    pub fn load(&self) -> u32 {
        self.value.load(Ordering::SeqCst)
    }

    /// Store a new value
    #[inline(always)]
    pub fn store(&self, value: u32) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Swap in a new value, returning the previous one
    #[inline(always)]
    pub fn swap(&self, value: u32) -> u32 {
        self.value.swap(value, Ordering::SeqCst)
    }

    /// Add `delta` to the value, returning the previous one (wrapping)
    #[inline(always)]
    pub fn fetch_add(&self, delta: u32) -> u32 {
        self.value.fetch_add(delta, Ordering::SeqCst)
    }

    /// Subtract `delta` from the value, returning the previous one (wrapping)
    #[inline(always)]
    pub fn fetch_sub(&self, delta: u32) -> u32 {
        self.value.fetch_sub(delta, Ordering::SeqCst)
    }

    /// Block while the current value equals `expected`
    ///
    /// Returns once the value is observed different from `expected`, once
    /// another thread calls [`wake_one`](Self::wake_one) or
    /// [`wake_all`](Self::wake_all), or spuriously. Callers must re-check
    /// their predicate in a loop.
    pub fn wait(&self, expected: u32) {
        // Park the thread using parking_lot_core. The validate callback
        // runs under the bucket lock: if the value has already changed,
        // the park is abandoned (ParkResult::Invalid) instead of sleeping
        // through a wake that was issued after our caller's last load.
        let result = unsafe {
            park(
                self.key(),
                || self.value.load(Ordering::SeqCst) == expected,
                || {},
                |_key, _was_last| {},
                ParkToken(0),
                None,
            )
        };
        debug_assert!(!matches!(result, ParkResult::TimedOut));
    }

    /// Wake one thread parked on this cell
    pub fn wake_one(&self) -> WakeResult {
        let result = unsafe { unpark_one(self.key(), |_| UnparkToken(0)) };
        if result.unparked_threads == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(result.unparked_threads)
        }
    }

    /// Wake all threads parked on this cell
    pub fn wake_all(&self) -> WakeResult {
        let unparked = unsafe { unpark_all(self.key(), UnparkToken(0)) };
        if unparked == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(unparked)
        }
    }
}

impl Default for WaitCell {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for WaitCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitCell").field("value", &self.load()).finish()
    }
}
