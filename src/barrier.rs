/*!
 * Cyclic Barrier
 *
 * Reusable rendezvous point: a set of threads all wait for each other to
 * reach a common barrier point, then the barrier resets for the next
 * cycle.
 *
 * # Design
 *
 * `target` starts at `participants` and advances by `participants` each
 * cycle; `arrived` counts arrivals across all cycles and never resets.
 * Each arriver captures the current `target` by value before blocking,
 * so its wait predicate refers to its own cycle. Overlapping cycles (a
 * fast thread entering cycle N+1 while a slow one is still leaving cycle
 * N) therefore stay correctly ordered: only the last arriver of a cohort
 * advances the target, and every cohort member observes
 * `arrived >= my_target` before proceeding.
 */

use crate::condvar::CondVar;
use crate::mutex::Mutex;

struct BarrierState {
    /// Next release threshold
    target: usize,
    /// Total arrivals since construction
    arrived: usize,
}

/// Reusable N-way rendezvous point
///
/// # Examples
///
/// ```
/// use synckit::CyclicBarrier;
/// use std::sync::Arc;
/// use std::thread;
///
/// let barrier = Arc::new(CyclicBarrier::new(3));
/// let handles: Vec<_> = (0..3)
///     .map(|_| {
///         let barrier = barrier.clone();
///         thread::spawn(move || barrier.arrive())
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// ```
pub struct CyclicBarrier {
    participants: usize,
    state: Mutex<BarrierState>,
    target_reached: CondVar,
}

impl CyclicBarrier {
    /// Create a barrier for `participants` threads
    ///
    /// # Panics
    ///
    /// Panics if `participants` is zero; a zero-participant barrier can
    /// never release anyone.
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "barrier requires at least one participant");
        Self {
            participants,
            state: Mutex::new(BarrierState {
                target: participants,
                arrived: 0,
            }),
            target_reached: CondVar::new(),
        }
    }

    /// Block until all participants of the current cycle have arrived
    ///
    /// The last arriver opens the next cycle and releases the cohort;
    /// release order across cohort members is unspecified.
    pub fn arrive(&self) {
        let mut state = self.state.lock();

        let my_target = state.target;
        state.arrived += 1;

        if state.arrived == my_target {
            state.target += self.participants;
            self.target_reached.notify_all();
        } else {
            while state.arrived < my_target {
                state = self.target_reached.wait(state);
            }
        }
    }
}

impl std::fmt::Debug for CyclicBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CyclicBarrier")
            .field("participants", &self.participants)
            .finish_non_exhaustive()
    }
}
