/*!
 * Counting Semaphores
 *
 * The classic blocking form ([`Semaphore`]) and a tagged variant
 * ([`TaggedSemaphore`]) whose permits are typed tokens.
 *
 * # Design
 *
 * Both are built from this crate's own [`Mutex`] and [`CondVar`] in the
 * textbook monitor shape: `acquire` loops on `permits == 0` under the
 * lock, `release` increments and notifies. Permits are not FIFO-ordered;
 * any blocked acquirer may be the one that proceeds.
 *
 * The tagged variant exists for composed structures that wire two
 * semaphores into one invariant (e.g. "space available" / "space taken"
 * in a bounded queue). Its permit carries a tag type parameter, so
 * redeeming a permit on a semaphore of a different tag is a compile
 * error rather than a silent accounting bug.
 */

use crate::condvar::CondVar;
use crate::mutex::Mutex;
use log::error;
use std::marker::PhantomData;

/// Counting semaphore
///
/// Restricts the number of threads that can hold a permit at once.
/// Invariant: the permit count never goes below zero.
pub struct Semaphore {
    /// Guarded by `permits`' own lock
    permits: Mutex<usize>,
    permits_available: CondVar,
}

impl Semaphore {
    /// Create a semaphore with `initial` permits
    pub const fn new(initial: usize) -> Self {
        Self {
            permits: Mutex::new(initial),
            permits_available: CondVar::new(),
        }
    }

    /// Take one permit, blocking until one is available
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            permits = self.permits_available.wait(permits);
        }
        *permits -= 1;
    }

    /// Return one permit to the semaphore
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        self.permits_available.notify_all();
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore").finish_non_exhaustive()
    }
}

/// Opaque permit minted by [`TaggedSemaphore::acquire`]
///
/// Must be redeemed exactly once via [`TaggedSemaphore::release`] on a
/// semaphore carrying the same tag type. Dropping a permit without
/// releasing it is a usage error: it is logged and debug-asserted,
/// because the permit it represents is lost to the counterpart semaphore.
#[must_use = "a permit must be released back to a same-tagged semaphore"]
pub struct Permit<Tag> {
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> Permit<Tag> {
    fn mint() -> Self {
        Self { _tag: PhantomData }
    }

    fn redeem(self) {
        std::mem::forget(self);
    }
}

impl<Tag> Drop for Permit<Tag> {
    fn drop(&mut self) {
        error!("semaphore permit dropped without release; a unit of capacity is lost");
        if !std::thread::panicking() {
            debug_assert!(false, "semaphore permit dropped without release");
        }
    }
}

/// Counting semaphore whose permits are typed tokens
///
/// Two logically paired instances share a tag type; a permit acquired
/// from one is released into the other. Permits cannot cross between
/// differently-tagged semaphores (rejected at compile time).
pub struct TaggedSemaphore<Tag> {
    inner: Semaphore,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> TaggedSemaphore<Tag> {
    /// Create a semaphore with `initial` permits
    pub const fn new(initial: usize) -> Self {
        Self {
            inner: Semaphore::new(initial),
            _tag: PhantomData,
        }
    }

    /// Take one permit, blocking until one is available
    pub fn acquire(&self) -> Permit<Tag> {
        self.inner.acquire();
        Permit::mint()
    }

    /// Redeem a permit into this semaphore
    pub fn release(&self, permit: Permit<Tag>) {
        permit.redeem();
        self.inner.release();
    }

    /// Acquire a permit held for the guard's lifetime and released on drop
    ///
    /// With an initial count of 1 this turns the semaphore into a binary
    /// mutual-exclusion gate.
    pub fn guard(&self) -> TaggedGuard<'_, Tag> {
        self.inner.acquire();
        TaggedGuard { semaphore: self }
    }
}

impl<Tag> std::fmt::Debug for TaggedSemaphore<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaggedSemaphore").finish_non_exhaustive()
    }
}

/// RAII permit for gate-style use of a [`TaggedSemaphore`]
#[must_use = "if unused the gate permit is returned immediately"]
pub struct TaggedGuard<'a, Tag> {
    semaphore: &'a TaggedSemaphore<Tag>,
}

impl<Tag> Drop for TaggedGuard<'_, Tag> {
    fn drop(&mut self) {
        self.semaphore.inner.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_acquire_release() {
        let sem = Semaphore::new(2);
        sem.acquire();
        sem.acquire();
        sem.release();
        sem.acquire();
        sem.release();
        sem.release();
    }

    #[test]
    fn test_acquire_blocks_at_zero() {
        let sem = Arc::new(Semaphore::new(0));
        let sem_clone = sem.clone();
        let acquired = Arc::new(AtomicUsize::new(0));
        let acquired_clone = acquired.clone();

        let handle = thread::spawn(move || {
            sem_clone.acquire();
            acquired_clone.store(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert_eq!(acquired.load(Ordering::SeqCst), 0);

        sem.release();
        handle.join().unwrap();
        assert_eq!(acquired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_at_most_k_outstanding() {
        const PERMITS: usize = 3;
        let sem = Arc::new(Semaphore::new(PERMITS));
        let outstanding = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sem = sem.clone();
                let outstanding = outstanding.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        sem.acquire();
                        let now = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                        assert!(now <= PERMITS);
                        outstanding.fetch_sub(1, Ordering::SeqCst);
                        sem.release();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_tagged_permit_round_trip() {
        enum SlotTag {}

        let taken = TaggedSemaphore::<SlotTag>::new(0);
        let available = TaggedSemaphore::<SlotTag>::new(1);

        let permit = available.acquire();
        taken.release(permit);
        let permit = taken.acquire();
        available.release(permit);
    }

    #[test]
    fn test_tagged_guard_is_binary_gate() {
        enum GateTag {}

        let gate = Arc::new(TaggedSemaphore::<GateTag>::new(1));
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let inside = inside.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let _guard = gate.guard();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        assert_eq!(now, 1);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
