/*!
 * One-Shot Future / Promise
 *
 * Asynchronous result pair: the promise side fulfills exactly once with
 * a value or an error, the future side blocks until the outcome lands.
 *
 * # Design
 *
 * Both handles share one channel: a "result ready" wait cell plus a
 * lock-guarded one-shot slot. The writer stores the outcome under the
 * lock, then flips the cell and wakes all waiters; the reader waits on
 * the cell and takes the outcome under the lock. The channel lives until
 * both handles are gone (`Arc`).
 *
 * Fulfilling consumes the [`Promise`], so double-satisfaction is a
 * compile error rather than a runtime fault. Reading consumes the
 * [`Future`] the same way. The one runtime-signalled usage error is
 * asking a promise for its future twice
 * ([`PromiseError::FutureAlreadyRetrieved`]).
 *
 * Failures travel as a stored error variant that `get` returns, not as a
 * re-raised exception; this is the only supported way to move a failure
 * across the promise/future boundary.
 */

use crate::cell::WaitCell;
use crate::mutex::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Failure payload transported from a promise to its future
pub type Failure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Promise usage errors
#[derive(Error, Debug)]
pub enum PromiseError {
    #[error("future was already retrieved from this promise")]
    FutureAlreadyRetrieved,
}

/// One-shot slot shared by a promise/future pair
struct Channel<T> {
    /// 0 until a result is stored, then 1
    has_result: WaitCell,
    slot: Mutex<Option<Result<T, Failure>>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            has_result: WaitCell::new(0),
            slot: Mutex::new(None),
        }
    }

    fn put(&self, outcome: Result<T, Failure>) {
        {
            let mut slot = self.slot.lock();
            debug_assert!(slot.is_none(), "one-shot channel filled twice");
            *slot = Some(outcome);
        }
        self.has_result.store(1);
        self.has_result.wake_all();
    }

    fn get(&self) -> Result<T, Failure> {
        while self.has_result.load() == 0 {
            self.has_result.wait(0);
        }

        self.slot
            .lock()
            .take()
            .expect("result flag set with an empty slot")
    }
}

/// Writer half of a one-shot result pair
///
/// Non-copyable, movable. Fulfilling consumes the promise.
pub struct Promise<T> {
    channel: Arc<Channel<T>>,
    future_retrieved: bool,
}

impl<T> Promise<T> {
    /// Create an unfulfilled promise
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Channel::new()),
            future_retrieved: false,
        }
    }

    /// Mint the future paired with this promise (one-shot)
    pub fn make_future(&mut self) -> Result<Future<T>, PromiseError> {
        if self.future_retrieved {
            return Err(PromiseError::FutureAlreadyRetrieved);
        }
        self.future_retrieved = true;
        Ok(Future {
            channel: self.channel.clone(),
        })
    }

    /// Fulfill the promise with a value
    pub fn set_value(self, value: T) {
        self.channel.put(Ok(value));
    }

    /// Fulfill the promise with a failure for the future to report
    pub fn set_error(self, error: impl Into<Failure>) {
        self.channel.put(Err(error.into()));
    }
}

impl<T> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("future_retrieved", &self.future_retrieved)
            .finish_non_exhaustive()
    }
}

/// Reader half of a one-shot result pair
///
/// Non-copyable, movable. Reading consumes the future.
pub struct Future<T> {
    channel: Arc<Channel<T>>,
}

impl<T> Future<T> {
    /// Block until the promise is fulfilled, then return the outcome
    pub fn get(self) -> Result<T, Failure> {
        self.channel.get()
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future").finish_non_exhaustive()
    }
}
