/*!
 * Blocking MPMC Queues
 *
 * Two composition styles over the same buffer shape:
 * - [`BoundedBlockingQueue`]: fixed capacity, built from two tagged
 *   counting semaphores plus a tagged binary gate (no condition-variable
 *   full/empty dance)
 * - [`UnboundedBlockingQueue`]: growable, lock + condition variable,
 *   with close (drain then stop) and cancel (stop and discard)
 */

mod bounded;
mod unbounded;

pub use bounded::BoundedBlockingQueue;
pub use unbounded::UnboundedBlockingQueue;
