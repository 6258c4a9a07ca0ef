/*!
 * Worker Thread Pool
 *
 * Fixed set of worker threads consuming an unbounded blocking queue of
 * tasks, with graceful drain (`wait_idle`) and shutdown (`stop`).
 *
 * # Lifecycle
 *
 * running (workers polling the queue) -> draining/stopping (queue
 * cancelled, workers finish their in-flight task and exit) -> stopped
 * (all workers joined). `stop` is the only way to reclaim the worker
 * threads; dropping a pool that still owns live workers is a usage
 * error.
 *
 * # Panic containment
 *
 * A panic escaping a task body is caught by the worker loop, logged,
 * and discarded. One failing task can neither kill its worker thread
 * nor stall `wait_idle`.
 */

mod counter;

pub use counter::ZeroWaitCounter;

use crate::queue::UnboundedBlockingQueue;
use log::{debug, error};
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

/// Unit of work executed by a worker thread
pub type Task = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    /// Pool the current worker thread belongs to. Set once when the
    /// worker starts, cleared only by thread exit; introspection only.
    static CURRENT_POOL: RefCell<Option<Weak<PoolInner>>> = const { RefCell::new(None) };
}

struct PoolInner {
    tasks: UnboundedBlockingQueue<Task>,
    /// Tasks submitted but not yet finished (queued or executing)
    outstanding: ZeroWaitCounter,
}

impl PoolInner {
    fn submit(&self, task: Task) -> bool {
        self.outstanding.inc();
        if self.tasks.put(task) {
            true
        } else {
            // Queue already closed: undo the accounting so wait_idle
            // cannot wedge on a task that will never run
            self.outstanding.dec();
            false
        }
    }
}

/// Fixed-size pool of worker threads
///
/// # Examples
///
/// ```
/// use synckit::ThreadPool;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// let mut pool = ThreadPool::new(4);
/// let counter = Arc::new(AtomicU32::new(0));
///
/// for _ in 0..100 {
///     let counter = counter.clone();
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     });
/// }
///
/// pool.wait_idle();
/// assert_eq!(counter.load(Ordering::SeqCst), 100);
/// pool.stop();
/// ```
pub struct ThreadPool {
    inner: Arc<PoolInner>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Launch a pool with `workers` worker threads
    ///
    /// # Panics
    ///
    /// Panics if `workers` is zero.
    pub fn new(workers: usize) -> Self {
        assert!(workers > 0, "thread pool requires at least one worker");

        let inner = Arc::new(PoolInner {
            tasks: UnboundedBlockingQueue::new(),
            outstanding: ZeroWaitCounter::new(),
        });

        let handles = (0..workers)
            .map(|_| {
                let inner = inner.clone();
                std::thread::spawn(move || worker_loop(inner))
            })
            .collect();

        debug!("thread pool started with {} workers", workers);

        Self {
            inner,
            workers: handles,
        }
    }

    /// Schedule `task` for execution on one of the worker threads
    ///
    /// Returns `false` (and drops the task) if the pool was already
    /// stopped.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.inner.submit(Box::new(task))
    }

    /// Block until no task is queued or executing
    ///
    /// Point-in-time guarantee: `submit` calls racing with the return of
    /// `wait_idle` are not prevented.
    pub fn wait_idle(&self) {
        self.inner.outstanding.wait();
    }

    /// Cancel pending tasks and join all workers
    ///
    /// In-flight tasks finish; tasks still queued are discarded.
    pub fn stop(&mut self) {
        self.inner.tasks.cancel();
        for handle in self.workers.drain(..) {
            if let Err(panic) = handle.join() {
                // Worker bodies catch task panics, so this is unexpected
                error!("worker thread terminated abnormally: {:?}", panic);
            }
        }
        debug!("thread pool stopped");
    }

    /// Pool the calling worker thread belongs to, `None` outside workers
    pub fn current() -> Option<PoolHandle> {
        CURRENT_POOL.with(|current| {
            current
                .borrow()
                .as_ref()
                .and_then(Weak::upgrade)
                .map(PoolHandle)
        })
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            error!("thread pool dropped with live workers; call stop() first");
            if !std::thread::panicking() {
                debug_assert!(false, "thread pool dropped without stop()");
            }
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

/// Handle to the pool a worker thread runs in, from
/// [`ThreadPool::current`]
///
/// Lets a task submit follow-up work to its own pool.
pub struct PoolHandle(Arc<PoolInner>);

impl PoolHandle {
    /// Schedule `task` on the pool this handle refers to
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.0.submit(Box::new(task))
    }
}

impl std::fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHandle").finish_non_exhaustive()
    }
}

fn worker_loop(inner: Arc<PoolInner>) {
    CURRENT_POOL.with(|current| {
        *current.borrow_mut() = Some(Arc::downgrade(&inner));
    });

    while let Some(task) = inner.tasks.take() {
        // Containment boundary: a panicking task is logged and dropped,
        // never propagated across the worker
        if let Err(panic) = catch_unwind(AssertUnwindSafe(task)) {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic payload>".to_string());
            error!("task panicked in worker: {}", message);
        }
        inner.outstanding.dec();
    }
}
