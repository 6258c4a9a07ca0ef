/*!
 * Bounded Blocking Queue
 *
 * Fixed-capacity multi-producer/multi-consumer queue composed from
 * counting semaphores.
 *
 * # Design
 *
 * Capacity accounting lives entirely in two tagged semaphores that share
 * one tag: `available_space` starts at the capacity, `taken_space` at
 * zero. A `put` moves one permit from `available_space` into
 * `taken_space`; a `take` moves it back. At every instant
 * `available + taken + permits in flight == capacity`, which rules out
 * both overfill and underflow without tracking full/empty conditions
 * separately. A third, differently-tagged binary semaphore serializes
 * the buffer mutation itself.
 *
 * There is no close or cancel: this queue is meant for pipelines whose
 * lifetime is fixed by their producers and consumers.
 */

use crate::semaphore::TaggedSemaphore;
use std::cell::UnsafeCell;
use std::collections::VecDeque;

/// Tag for capacity/occupancy permits (shared by both counting semaphores,
/// so a permit flows between them but cannot leak into the gate)
enum SlotTag {}

/// Tag for the binary mutual-exclusion gate
enum GateTag {}

/// Fixed-capacity blocking MPMC queue
///
/// `put` blocks while the queue is full; `take` blocks while it is
/// empty. FIFO per producer/consumer pair.
///
/// # Examples
///
/// ```
/// use synckit::BoundedBlockingQueue;
///
/// let queue = BoundedBlockingQueue::new(2);
/// queue.put(1);
/// queue.put(2);
/// assert_eq!(queue.take(), 1);
/// assert_eq!(queue.take(), 2);
/// ```
pub struct BoundedBlockingQueue<T> {
    buffer: UnsafeCell<VecDeque<T>>,
    available_space: TaggedSemaphore<SlotTag>,
    taken_space: TaggedSemaphore<SlotTag>,
    gate: TaggedSemaphore<GateTag>,
}

// Safety: the buffer is only touched while holding the binary gate
// permit, which admits one thread at a time; elements cross threads, so
// `T: Send` is required.
unsafe impl<T: Send> Sync for BoundedBlockingQueue<T> {}
unsafe impl<T: Send> Send for BoundedBlockingQueue<T> {}

impl<T> BoundedBlockingQueue<T> {
    /// Create a queue holding at most `capacity` elements
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; every `put` on a zero-capacity
    /// queue would block forever.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded queue requires a nonzero capacity");
        Self {
            buffer: UnsafeCell::new(VecDeque::with_capacity(capacity)),
            available_space: TaggedSemaphore::new(capacity),
            taken_space: TaggedSemaphore::new(0),
            gate: TaggedSemaphore::new(1),
        }
    }

    /// Insert `value`, blocking until space is available
    pub fn put(&self, value: T) {
        let slot = self.available_space.acquire();
        {
            let _gate = self.gate.guard();
            // Safety: gate permit held, see Sync impl
            unsafe { &mut *self.buffer.get() }.push_back(value);
        }
        self.taken_space.release(slot);
    }

    /// Remove and return the oldest element, blocking until one exists
    pub fn take(&self) -> T {
        let slot = self.taken_space.acquire();
        let value = {
            let _gate = self.gate.guard();
            // Safety: gate permit held, see Sync impl
            unsafe { &mut *self.buffer.get() }
                .pop_front()
                .expect("taken-space permit implies a buffered element")
        };
        self.available_space.release(slot);
        value
    }
}

impl<T> std::fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBlockingQueue").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    #[should_panic(expected = "nonzero capacity")]
    fn test_zero_capacity_rejected() {
        let _ = BoundedBlockingQueue::<u32>::new(0);
    }

    #[test]
    fn test_fifo_order() {
        let queue = BoundedBlockingQueue::new(4);
        queue.put(1);
        queue.put(2);
        queue.put(3);
        assert_eq!(queue.take(), 1);
        assert_eq!(queue.take(), 2);
        assert_eq!(queue.take(), 3);
    }

    #[test]
    fn test_put_blocks_when_full() {
        let queue = Arc::new(BoundedBlockingQueue::new(1));
        let queue_clone = queue.clone();
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflowed_clone = overflowed.clone();

        queue.put(1);

        let handle = thread::spawn(move || {
            queue_clone.put(2); // capacity exceeded: must block
            overflowed_clone.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!overflowed.load(Ordering::SeqCst));

        assert_eq!(queue.take(), 1);
        handle.join().unwrap();
        assert!(overflowed.load(Ordering::SeqCst));
        assert_eq!(queue.take(), 2);
    }

    #[test]
    fn test_take_blocks_when_empty() {
        let queue = Arc::new(BoundedBlockingQueue::new(1));
        let queue_clone = queue.clone();

        let handle = thread::spawn(move || queue_clone.take());

        thread::sleep(Duration::from_millis(50));
        queue.put(99);

        assert_eq!(handle.join().unwrap(), 99);
    }

    #[test]
    fn test_mpmc_conserves_elements() {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: u64 = 1000;

        let queue = Arc::new(BoundedBlockingQueue::new(8));

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        queue.put(p as u64 * PER_PRODUCER + i);
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = queue.clone();
                thread::spawn(move || {
                    let mut sum = 0u64;
                    for _ in 0..(PRODUCERS as u64 * PER_PRODUCER / CONSUMERS as u64) {
                        sum += queue.take();
                    }
                    sum
                })
            })
            .collect();

        for handle in producers {
            handle.join().unwrap();
        }
        let total: u64 = consumers.into_iter().map(|h| h.join().unwrap()).sum();

        let n = PRODUCERS as u64 * PER_PRODUCER;
        assert_eq!(total, n * (n - 1) / 2);
    }
}
