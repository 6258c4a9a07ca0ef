/*!
 * Thread Pool Integration Tests
 *
 * Drain, shutdown, panic containment and current-pool introspection
 */

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use synckit::ThreadPool;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_all_tasks_observed_after_wait_idle() {
    init_logging();

    for workers in [1usize, 2, 4, 16, 64] {
        const TASKS: u32 = 10_000;

        let mut pool = ThreadPool::new(workers);
        let counter = Arc::new(AtomicU32::new(0));

        for _ in 0..TASKS {
            let counter = counter.clone();
            assert!(pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        pool.wait_idle();
        assert_eq!(
            counter.load(Ordering::SeqCst),
            TASKS,
            "lost tasks with {} workers",
            workers
        );
        pool.stop();
    }
}

#[test]
fn test_wait_idle_is_reusable() {
    init_logging();
    let mut pool = ThreadPool::new(4);
    let counter = Arc::new(AtomicU32::new(0));

    for round in 1..=3u32 {
        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.wait_idle();
        assert_eq!(counter.load(Ordering::SeqCst), round * 100);
    }

    pool.stop();
}

#[test]
fn test_panicking_task_is_contained() {
    init_logging();
    let mut pool = ThreadPool::new(2);
    let completed = Arc::new(AtomicU32::new(0));

    pool.submit(|| panic!("task gone wrong"));

    // Workers must survive and keep executing later tasks
    for _ in 0..50 {
        let completed = completed.clone();
        pool.submit(move || {
            completed.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.wait_idle();
    assert_eq!(completed.load(Ordering::SeqCst), 50);
    pool.stop();
}

#[test]
fn test_stop_discards_pending_tasks() {
    init_logging();
    let mut pool = ThreadPool::new(1);
    let executed = Arc::new(AtomicU32::new(0));

    // First task holds the single worker long enough for the rest to pile up
    pool.submit(|| thread::sleep(Duration::from_millis(100)));
    for _ in 0..100 {
        let executed = executed.clone();
        pool.submit(move || {
            executed.fetch_add(1, Ordering::SeqCst);
        });
    }

    pool.stop();

    // The in-flight sleeper finished; the queued increments were discarded
    assert!(executed.load(Ordering::SeqCst) < 100);
}

#[test]
fn test_submit_after_stop_returns_false() {
    init_logging();
    let mut pool = ThreadPool::new(2);
    pool.stop();

    assert!(!pool.submit(|| unreachable!("must never run")));
    pool.wait_idle();
}

#[test]
fn test_current_pool_inside_task() {
    init_logging();
    let mut pool = ThreadPool::new(2);
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = seen.clone();

    pool.submit(move || {
        if ThreadPool::current().is_some() {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }
    });

    pool.wait_idle();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(ThreadPool::current().is_none());
    pool.stop();
}

#[test]
fn test_nested_submit_through_current() {
    init_logging();
    let mut pool = ThreadPool::new(2);
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    pool.submit(move || {
        let own_pool = ThreadPool::current().expect("task runs inside a worker");
        for _ in 0..10 {
            let counter = counter_clone.clone();
            own_pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    });

    pool.wait_idle();
    assert_eq!(counter.load(Ordering::SeqCst), 10);
    pool.stop();
}

#[test]
fn test_tasks_run_concurrently_across_workers() {
    init_logging();
    let mut pool = ThreadPool::new(4);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    for _ in 0..16 {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        pool.submit(move || {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(30));
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });
    }

    pool.wait_idle();
    // With 4 workers and 30ms tasks, at least two must have overlapped
    assert!(peak.load(Ordering::SeqCst) >= 2);
    pool.stop();
}
