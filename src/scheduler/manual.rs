use super::{run_guarded, DelayRange, Scheduler, Work};
use crate::observability::SchedulerMetrics;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

struct QueuedWork {
    due: Duration,
    seq: u64,
    work: Work,
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_seq: u64,
    queue: Vec<QueuedWork>,
}

/// Scheduler driven by an explicit virtual clock.
///
/// Work is queued with a due time of `now + sampled delay` and only runs when
/// the owner calls `fire_next`/`fire_all`/`advance`, which makes background
/// behaviour deterministic in tests and step-through simulations.
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<VirtualClock>,
    metrics: Arc<SchedulerMetrics>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.queue.len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.clock.lock().now
    }

    pub fn pending(&self) -> usize {
        self.clock.lock().queue.len()
    }

    pub fn metrics(&self) -> &Arc<SchedulerMetrics> {
        &self.metrics
    }

    /// Run the earliest due work, moving the clock to its due time.
    ///
    /// The work runs outside the queue lock so it may schedule more work.
    pub fn fire_next(&self) -> bool {
        let next = {
            let mut clock = self.clock.lock();
            let Some(idx) = clock
                .queue
                .iter()
                .enumerate()
                .min_by_key(|(_, queued)| (queued.due, queued.seq))
                .map(|(idx, _)| idx)
            else {
                return false;
            };
            let queued = clock.queue.swap_remove(idx);
            if queued.due > clock.now {
                clock.now = queued.due;
            }
            queued
        };
        run_guarded(next.work, &self.metrics);
        true
    }

    /// Fire until the queue is empty, including work queued while firing
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }

    /// Move the clock forward by `by`, firing everything that falls due
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut fired = 0;
        loop {
            let due_now = {
                let clock = self.clock.lock();
                clock.queue.iter().any(|queued| queued.due <= target)
            };
            if !due_now || !self.fire_next() {
                break;
            }
            fired += 1;
        }
        let mut clock = self.clock.lock();
        if target > clock.now {
            clock.now = target;
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, after: DelayRange, work: Work) {
        let delay = after.sample();
        self.metrics.record_scheduled();
        let mut clock = self.clock.lock();
        let due = clock.now + delay;
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.queue.push(QueuedWork { due, seq, work });
    }
}
