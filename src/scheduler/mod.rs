// Scheduler - delayed, fire-and-forget background work
//
// Callers hand over a closure and return immediately. Nobody is left to
// observe the closure's outcome, so failures are caught here, logged and
// counted instead of being propagated.

pub mod manual;
pub mod runtime;

use crate::observability::SchedulerMetrics;
use rand::Rng;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;

/// Zero-argument unit of background work
pub type Work = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Inclusive range a scheduling delay is drawn from uniformly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }
}

pub trait Scheduler: Send + Sync {
    /// Run `work` once after a delay drawn from `after`, without blocking
    fn schedule(&self, after: DelayRange, work: Work);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, after: DelayRange, work: Work) {
        (**self).schedule(after, work)
    }
}

/// Execute scheduled work, containing errors and panics
pub(crate) fn run_guarded(work: Work, metrics: &SchedulerMetrics) {
    metrics.record_fired();
    match std::panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            metrics.record_failure();
            error!(error = %format!("{e:#}"), "Scheduled work failed");
        }
        Err(payload) => {
            metrics.record_failure();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(panic = %message, "Scheduled work panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_range_orders_bounds() {
        let range = DelayRange::from_millis(500, 100);
        assert_eq!(range.min, Duration::from_millis(100));
        assert_eq!(range.max, Duration::from_millis(500));
    }

    #[test]
    fn test_delay_sample_within_bounds() {
        let range = DelayRange::from_millis(100, 300);
        for _ in 0..200 {
            let delay = range.sample();
            assert!(delay >= range.min && delay <= range.max);
        }
    }

    #[test]
    fn test_fixed_delay_sample() {
        let range = DelayRange::fixed(Duration::from_secs(2));
        assert_eq!(range.sample(), Duration::from_secs(2));
    }

    #[test]
    fn test_run_guarded_contains_errors_and_panics() {
        let metrics = SchedulerMetrics::new();

        run_guarded(Box::new(|| Ok(())), &metrics);
        run_guarded(Box::new(|| Err(anyhow::anyhow!("simulated failure"))), &metrics);
        run_guarded(Box::new(|| panic!("simulated panic")), &metrics);

        let stats = metrics.get_stats();
        assert_eq!(stats.fired, 3);
        assert_eq!(stats.failed, 2);
    }
}
