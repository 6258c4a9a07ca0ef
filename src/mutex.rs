/*!
 * Futex-Based Mutex
 *
 * Exclusive lock built on one wait/wake cell plus a waiter count.
 *
 * # Design
 *
 * `lock` swaps the lock word to 1; if it was already 1, the thread
 * registers itself in the waiter count and parks on the cell until the
 * word changes, then retries the swap. `unlock` stores 0 and wakes one
 * parked thread only if the waiter count is nonzero (uncontended unlock
 * stays syscall-free). Barging is allowed: a freshly woken waiter races
 * newcomers for the swap, so there is no FIFO fairness - only mutual
 * exclusion and eventual progress.
 */

use crate::cell::WaitCell;
use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// Mutual exclusion lock owning the data it guards
///
/// # Examples
///
/// ```
/// use synckit::Mutex;
/// use std::sync::Arc;
/// use std::thread;
///
/// let counter = Arc::new(Mutex::new(0u64));
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let counter = counter.clone();
///         thread::spawn(move || {
///             for _ in 0..1000 {
///                 *counter.lock() += 1;
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(*counter.lock(), 4000);
/// ```
pub struct Mutex<T: ?Sized> {
    /// 1 while held, 0 otherwise
    locked: WaitCell,
    /// Number of threads parked in `lock`
    waiting: WaitCell,
    value: UnsafeCell<T>,
}

// Safety: the lock word guarantees at most one thread touches `value`
// at a time, so only `T: Send` is required.
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

impl<T> Mutex<T> {
    /// Create an unlocked mutex owning `value`
    pub const fn new(value: T) -> Self {
        Self {
            locked: WaitCell::new(0),
            waiting: WaitCell::new(0),
            value: UnsafeCell::new(value),
        }
    }

    /// Consume the mutex, returning the owned data
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquire the lock, blocking until it is available
    pub fn lock(&self) -> MutexGuard<'_, T> {
        while self.locked.swap(1) == 1 {
            self.waiting.fetch_add(1);
            self.locked.wait(1);
            self.waiting.fetch_sub(1);
        }
        MutexGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    /// Acquire the lock only if it is free right now
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        if self.locked.swap(1) == 0 {
            Some(MutexGuard {
                lock: self,
                _not_send: PhantomData,
            })
        } else {
            None
        }
    }

    /// Mutable access without locking (the borrow is the exclusion proof)
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub(crate) fn unlock(&self) {
        self.locked.store(0);
        if self.waiting.load() > 0 {
            self.locked.wake_one();
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized + std::fmt::Debug> std::fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.try_lock() {
            Some(guard) => f.debug_struct("Mutex").field("value", &&*guard).finish(),
            None => f.debug_struct("Mutex").field("value", &"<locked>").finish(),
        }
    }
}

/// RAII guard: the lock is released when the guard is dropped, on every
/// exit path including unwinding
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T: ?Sized> {
    lock: &'a Mutex<T>,
    // Guards stay on the locking thread (parking_lot's GuardNoSend rule)
    _not_send: PhantomData<*mut ()>,
}

// Safety: sharing `&MutexGuard` only hands out `&T`, so `T: Sync` suffices.
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<'a, T: ?Sized> MutexGuard<'a, T> {
    /// The mutex this guard locks (used by [`CondVar`](crate::CondVar)
    /// to relock after waiting)
    pub fn mutex(guard: &Self) -> &'a Mutex<T> {
        guard.lock
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: the guard proves the lock is held
        unsafe { &*self.lock.value.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard proves the lock is held
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

impl<T: ?Sized + std::fmt::Debug> std::fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&**self, f)
    }
}
