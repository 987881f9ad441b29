//! # Worker Pool & Job Dispatch Protocol
//!
//! N persistent OS worker threads behind a repeatable fork-join barrier.
//!
//! ## Safety Note
//!
//! This module requires unsafe code to hand a borrowed job closure to the
//! persistent workers. All unsafe blocks are carefully reviewed and
//! documented.

#![allow(unsafe_code)]
//!
//! ## Protocol
//!
//! ```text
//!  dispatcher                         worker x N
//!  ───────────                        ──────────
//!  next_item = 0                      wait for epoch change ──┐
//!  publish job, epoch += 1  ────────► claim: next_item++      │
//!  wait until running == 0           run job(item) until      │
//!       ▲                            item >= item_count       │
//!       └──────────────────────────  running -= 1, notify ────┘
//! ```
//!
//! Dynamic claiming through a single atomic counter absorbs load imbalance
//! from non-uniform triangle/particle density across tiles. The counter is
//! the only shared mutable state the protocol itself needs; everything the
//! jobs touch is partitioned by tile rectangle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

/// The shape every dispatched job has: "process work item `i`".
pub type Job = dyn Fn(usize) + Sync;

/// Type-erased pointer to the job currently being executed.
///
/// The pointer is borrowed from the `dispatch` caller's stack; it is only
/// dereferenced between the epoch bump and the final completion signal of
/// that same dispatch, which blocks until then.
struct JobSlot(*const Job);

// SAFETY: the raw pointer crosses threads inside the barrier's mutex; the
// dispatch protocol guarantees the pointee outlives every dereference.
unsafe impl Send for JobSlot {}

/// Barrier state guarded by the mutex.
struct BarrierState {
    /// Bumped once per dispatch; workers run when it changes.
    epoch: u64,
    /// The job to run this epoch.
    job: Option<JobSlot>,
    /// Number of work items this epoch.
    item_count: usize,
    /// Workers still executing the current epoch.
    running: usize,
    /// Cooperative shutdown flag, observed at the top of the wait loop.
    quit: bool,
}

struct Shared {
    state: Mutex<BarrierState>,
    start: Condvar,
    done: Condvar,
    /// The "next tile" claim counter.
    next_item: AtomicUsize,
}

/// Persistent worker pool with a fork-join dispatch barrier.
///
/// Invoked roughly four times per frame: entity render, particle physics,
/// particle tile-binning, particle compositing. The calling thread does not
/// claim work; it blocks until all workers have signaled completion.
pub struct JobSystem {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl JobSystem {
    /// Spawns `thread_count` named persistent workers.
    ///
    /// # Panics
    ///
    /// Panics if `thread_count` is zero or the OS refuses to spawn a thread -
    /// top-level resource creation is the one fatal path in the engine.
    #[must_use]
    pub fn new(thread_count: usize) -> Self {
        assert!(thread_count > 0, "JobSystem needs at least one worker");

        let shared = Arc::new(Shared {
            state: Mutex::new(BarrierState {
                epoch: 0,
                job: None,
                item_count: 0,
                running: 0,
                quit: false,
            }),
            start: Condvar::new(),
            done: Condvar::new(),
            next_item: AtomicUsize::new(0),
        });

        let workers = (0..thread_count)
            .map(|i| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("basilisk-worker-{i}"))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        tracing::info!(threads = thread_count, "job system online");
        Self { shared, workers }
    }

    /// Number of persistent workers.
    #[inline]
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }

    /// Runs `job` across `item_count` work items and blocks until every
    /// worker has signaled completion.
    ///
    /// Work items are claimed dynamically: each worker atomically increments
    /// the shared counter until it exceeds `item_count`. Item order across
    /// workers is unspecified; ordering *between* dispatches is strict.
    ///
    /// The mutex hand-off on completion gives the caller a happens-before
    /// edge over every write the jobs performed.
    pub fn dispatch(&self, item_count: usize, job: &(dyn Fn(usize) + Sync)) {
        if item_count == 0 {
            return;
        }

        let mut state = self.shared.state.lock();
        debug_assert_eq!(state.running, 0, "dispatch while a phase is running");

        self.shared.next_item.store(0, Ordering::Relaxed);
        // SAFETY: erase the borrowed job's lifetime to the `'static`-typed
        // raw pointer the slot holds. The pointee outlives every worker
        // dereference because this method blocks until `running` hits zero.
        let job_ptr: *const Job =
            unsafe { std::mem::transmute::<*const (dyn Fn(usize) + Sync), *const Job>(job) };
        state.job = Some(JobSlot(job_ptr));
        state.item_count = item_count;
        state.running = self.workers.len();
        state.epoch = state.epoch.wrapping_add(1);
        self.shared.start.notify_all();

        while state.running > 0 {
            self.shared.done.wait(&mut state);
        }
        state.job = None;
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.quit = true;
        }
        self.shared.start.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        tracing::info!("job system offline");
    }
}

fn worker_loop(shared: &Shared) {
    let mut last_epoch = 0u64;
    let mut state = shared.state.lock();
    loop {
        if state.quit {
            return;
        }
        if state.epoch != last_epoch {
            last_epoch = state.epoch;
            let published = state.job.as_ref().map(|slot| slot.0);
            let Some(job_ptr) = published else {
                state.running -= 1;
                if state.running == 0 {
                    shared.done.notify_one();
                }
                continue;
            };
            let item_count = state.item_count;
            drop(state);

            // SAFETY: `dispatch` does not return (and therefore the borrowed
            // closure does not die) until `running` reaches zero, which only
            // happens after this worker is done dereferencing the pointer.
            let job: &Job = unsafe { &*job_ptr };
            loop {
                let item = shared.next_item.fetch_add(1, Ordering::Relaxed);
                if item >= item_count {
                    break;
                }
                job(item);
            }

            state = shared.state.lock();
            state.running -= 1;
            if state.running == 0 {
                shared.done.notify_one();
            }
        } else {
            shared.start.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_dispatch_visits_every_item_once() {
        let jobs = JobSystem::new(4);
        let visited: Vec<AtomicU64> = (0..100).map(|_| AtomicU64::new(0)).collect();

        jobs.dispatch(visited.len(), &|i| {
            visited[i].fetch_add(1, Ordering::Relaxed);
        });

        for slot in &visited {
            assert_eq!(slot.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn test_repeated_dispatches_are_ordered() {
        let jobs = JobSystem::new(3);
        let sum = AtomicU64::new(0);

        // Phase two reads what phase one wrote; the barrier orders them.
        jobs.dispatch(10, &|i| {
            sum.fetch_add(i as u64, Ordering::Relaxed);
        });
        let after_first = sum.load(Ordering::Relaxed);
        assert_eq!(after_first, 45);

        jobs.dispatch(10, &|_| {
            sum.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 55);
    }

    #[test]
    fn test_more_items_than_threads() {
        let jobs = JobSystem::new(2);
        let count = AtomicU64::new(0);
        jobs.dispatch(1000, &|_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 1000);
    }

    #[test]
    fn test_zero_items_is_a_no_op() {
        let jobs = JobSystem::new(2);
        jobs.dispatch(0, &|_| panic!("job must not run"));
    }

    #[test]
    fn test_single_worker() {
        let jobs = JobSystem::new(1);
        let count = AtomicU64::new(0);
        jobs.dispatch(64, &|_| {
            count.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(count.load(Ordering::Relaxed), 64);
    }
}
