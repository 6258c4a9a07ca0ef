/*!
 * Unbounded Blocking Queue
 *
 * Growable multi-producer/multi-consumer queue with two shutdown modes:
 * close (refuse new items, let buffered ones drain) and cancel (refuse
 * new items and discard the buffer).
 */

use crate::condvar::CondVar;
use crate::mutex::Mutex;
use std::collections::VecDeque;

struct QueueState<T> {
    buffer: VecDeque<T>,
    closed: bool,
    /// Consumers currently parked in `take`. Advisory only: `put` skips
    /// the notify when nobody waits, but the wait loop tolerates both
    /// extra and coalesced wakeups, so correctness never rests on this
    /// count.
    waiting: usize,
}

/// Growable blocking MPMC queue with close/cancel
///
/// `take` returning `None` is the end-of-stream signal: the queue was
/// closed or cancelled and holds nothing more to drain.
pub struct UnboundedBlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    can_take: CondVar,
}

impl<T> UnboundedBlockingQueue<T> {
    /// Create an empty open queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                buffer: VecDeque::new(),
                closed: false,
                waiting: 0,
            }),
            can_take: CondVar::new(),
        }
    }

    /// Append `value`; returns `false` without enqueuing if the queue is
    /// already closed or cancelled
    pub fn put(&self, value: T) -> bool {
        let mut state = self.state.lock();

        if state.closed {
            return false;
        }

        state.buffer.push_back(value);
        if state.waiting > 0 {
            self.can_take.notify_one();
        }
        true
    }

    /// Remove the oldest element, blocking while the queue is empty and
    /// still open; `None` once closed and drained
    pub fn take(&self) -> Option<T> {
        let mut state = self.state.lock();

        while !state.closed && state.buffer.is_empty() {
            state.waiting += 1;
            state = self.can_take.wait(state);
            state.waiting -= 1;
        }

        state.buffer.pop_front()
    }

    /// Stop new `put`s; buffered items remain drainable
    pub fn close(&self) {
        self.close_impl(false);
    }

    /// Stop new `put`s and discard buffered items immediately
    pub fn cancel(&self) {
        self.close_impl(true);
    }

    fn close_impl(&self, discard: bool) {
        let mut state = self.state.lock();
        state.closed = true;
        if discard {
            state.buffer.clear();
        }
        // Unconditional: every parked consumer must observe the closed flag
        self.can_take.notify_all();
    }
}

impl<T> Default for UnboundedBlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for UnboundedBlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnboundedBlockingQueue").finish_non_exhaustive()
    }
}
