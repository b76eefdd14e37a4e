use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Run store counters
#[derive(Debug, Default)]
pub struct RunMetrics {
    pub runs_created: AtomicU64,
    pub checkpoints_added: AtomicU64,
    pub checkpoints_resolved: AtomicU64,
    pub runs_completed: AtomicU64,
    pub runs_failed: AtomicU64,
    pub rejected_mutations: AtomicU64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run_created(&self) {
        self.runs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint_added(&self) {
        self.checkpoints_added.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint_resolved(&self) {
        self.checkpoints_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejected_mutations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> RunStats {
        RunStats {
            runs_created: self.runs_created.load(Ordering::Relaxed),
            checkpoints_added: self.checkpoints_added.load(Ordering::Relaxed),
            checkpoints_resolved: self.checkpoints_resolved.load(Ordering::Relaxed),
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            rejected_mutations: self.rejected_mutations.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Run metrics: created={}, checkpoints_added={}, checkpoints_resolved={}, completed={}, failed={}, rejected={}",
            stats.runs_created,
            stats.checkpoints_added,
            stats.checkpoints_resolved,
            stats.runs_completed,
            stats.runs_failed,
            stats.rejected_mutations
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub runs_created: u64,
    pub checkpoints_added: u64,
    pub checkpoints_resolved: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub rejected_mutations: u64,
}

/// Background work counters; `failed` is the sink for errors nobody awaits
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    pub scheduled: AtomicU64,
    pub fired: AtomicU64,
    pub failed: AtomicU64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scheduled(&self) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fired(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> SchedulerStats {
        SchedulerStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scheduler metrics: scheduled={}, fired={}, failed={}",
            stats.scheduled, stats.fired, stats.failed
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub scheduled: u64,
    pub fired: u64,
    pub failed: u64,
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}
