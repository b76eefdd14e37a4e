use super::{run_guarded, DelayRange, Scheduler, Work};
use crate::observability::SchedulerMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::{Handle, TryCurrentError};
use tracing::{debug, Instrument};

/// Scheduler backed by tokio timers.
///
/// Each call spawns one task that sleeps for the sampled delay and then runs
/// the work. Tasks are not cancellable from outside; the number still in
/// flight is tracked so shutdown can drain them.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
    in_flight: Arc<AtomicUsize>,
    metrics: Arc<SchedulerMetrics>,
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            in_flight: Arc::new(AtomicUsize::new(0)),
            metrics: Arc::new(SchedulerMetrics::new()),
        }
    }

    /// Bind to the runtime the caller is running on
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> &Arc<SchedulerMetrics> {
        &self.metrics
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: DelayRange, work: Work) {
        let delay = after.sample();
        self.metrics.record_scheduled();
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let metrics = Arc::clone(&self.metrics);

        debug!(delay_ms = delay.as_millis() as u64, "Scheduling background work");

        // Keep the caller's span so logs from the work stay correlated
        let span = tracing::Span::current();
        self.handle.spawn(
            async move {
                let _guard = guard;
                tokio::time::sleep(delay).await;
                run_guarded(work, &metrics);
            }
            .instrument(span),
        );
    }
}
