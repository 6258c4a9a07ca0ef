/*!
 * synckit
 *
 * Blocking synchronization primitives and a worker thread pool, layered
 * on a single futex-style wait/wake cell.
 *
 * # Architecture
 *
 * Everything grows from [`cell::WaitCell`], an atomic u32 a thread can
 * block on until its value changes (parking_lot_core underneath; direct
 * futex syscalls on Linux). On top of it, in dependency order:
 *
 * - [`Mutex`] - exclusive lock (lock word + waiter count)
 * - [`CondVar`] - generation-counter condition variable
 * - [`Semaphore`] / [`TaggedSemaphore`] - counting permits, optionally
 *   as typed tokens that cannot cross between unrelated instances
 * - [`CyclicBarrier`] - reusable N-way rendezvous
 * - [`Promise`] / [`Future`] - one-shot result pair
 * - [`BoundedBlockingQueue`] - MPMC queue from two tagged semaphores
 *   plus a tagged gate
 * - [`UnboundedBlockingQueue`] - MPMC queue with close/cancel
 * - [`ThreadPool`] - fixed workers, graceful drain and shutdown
 *
 * Every primitive parks rather than spins, tolerates spurious wakeups
 * through predicate loops, and owns its mutable state exclusively.
 */

pub mod barrier;
pub mod cell;
pub mod condvar;
pub mod future;
pub mod mutex;
pub mod pool;
pub mod queue;
pub mod semaphore;

// Re-exports
pub use barrier::CyclicBarrier;
pub use cell::{WaitCell, WakeResult};
pub use condvar::CondVar;
pub use future::{Failure, Future, Promise, PromiseError};
pub use mutex::{Mutex, MutexGuard};
pub use pool::{PoolHandle, Task, ThreadPool, ZeroWaitCounter};
pub use queue::{BoundedBlockingQueue, UnboundedBlockingQueue};
pub use semaphore::{Permit, Semaphore, TaggedGuard, TaggedSemaphore};
