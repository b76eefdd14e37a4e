// Automation Driver - simulated browser automation on top of the run store
//
// Starting a run schedules exactly one progress step, which either raises a
// checkpoint or completes the run. Resolving a checkpoint schedules exactly
// one completion attempt. Late callbacks that lose a race against callers
// are rejected by the store and treated as no-ops.

pub mod strategy;

use crate::config::SimulationConfig;
use crate::runs::{CheckpointId, NewRun, Run, RunId, RunStore, RunStoreError};
use crate::scheduler::{DelayRange, Scheduler};
use crate::telemetry::create_run_span;
use anyhow::{anyhow, Context};
use std::sync::Arc;
use tracing::debug;

pub use strategy::{FixedOutcome, OutcomeStrategy, RandomOutcome, SimulatedOutcome};

/// Delays used for the simulated automation steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTiming {
    pub progress: DelayRange,
    pub completion: DelayRange,
}

impl From<&SimulationConfig> for SimulationTiming {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            progress: config.progress_delay.into(),
            completion: config.completion_delay.into(),
        }
    }
}

pub struct AutomationDriver {
    store: Arc<RunStore>,
    scheduler: Arc<dyn Scheduler>,
    strategy: Arc<dyn OutcomeStrategy>,
    timing: SimulationTiming,
}

impl std::fmt::Debug for AutomationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationDriver")
            .field("runs", &self.store.len())
            .field("strategy", &self.strategy)
            .field("timing", &self.timing)
            .finish()
    }
}

impl AutomationDriver {
    pub fn new(
        store: Arc<RunStore>,
        scheduler: Arc<dyn Scheduler>,
        strategy: Arc<dyn OutcomeStrategy>,
        timing: SimulationTiming,
    ) -> Self {
        Self {
            store,
            scheduler,
            strategy,
            timing,
        }
    }

    /// Driver with a random outcome strategy taken from configuration
    pub fn from_config(
        store: Arc<RunStore>,
        scheduler: Arc<dyn Scheduler>,
        config: &SimulationConfig,
    ) -> Self {
        Self::new(
            store,
            scheduler,
            Arc::new(RandomOutcome::new(config.checkpoint_probability)),
            SimulationTiming::from(config),
        )
    }

    pub fn store(&self) -> &Arc<RunStore> {
        &self.store
    }

    pub fn timing(&self) -> SimulationTiming {
        self.timing
    }

    /// Create a run and schedule its simulated progress
    pub fn start_run(&self, request: NewRun) -> Run {
        let run = self.store.create_run(request);
        let outcome = self.strategy.choose(&run);

        let span = create_run_span("simulate_progress", &run.id, &run.trace_id);
        let _entered = span.enter();
        debug!(outcome = ?outcome, "Simulated outcome chosen");

        let store = Arc::clone(&self.store);
        let run_id = run.id.clone();
        match outcome {
            SimulatedOutcome::RaiseCheckpoint => {
                let data = self.strategy.checkpoint_data(&run);
                self.scheduler.schedule(
                    self.timing.progress,
                    Box::new(move || raise_checkpoint(&store, &run_id, data)),
                );
            }
            SimulatedOutcome::Complete => {
                self.scheduler.schedule(
                    self.timing.progress,
                    Box::new(move || attempt_completion(&store, &run_id)),
                );
            }
        }
        run
    }

    /// Resolve a checkpoint and schedule one follow-up completion attempt
    pub fn resolve_checkpoint(
        &self,
        run_id: &RunId,
        checkpoint_id: &CheckpointId,
    ) -> Result<(), RunStoreError> {
        self.store.resolve_checkpoint(run_id, checkpoint_id)?;

        let trace_id = self
            .store
            .get_run(run_id)
            .map(|run| run.trace_id)
            .unwrap_or_default();
        let span = create_run_span("complete_after_checkpoint", run_id, &trace_id);
        let _entered = span.enter();

        let store = Arc::clone(&self.store);
        let run_id = run_id.clone();
        self.scheduler.schedule(
            self.timing.completion,
            Box::new(move || attempt_completion(&store, &run_id)),
        );
        Ok(())
    }
}

fn raise_checkpoint(
    store: &RunStore,
    run_id: &RunId,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    match store.add_checkpoint(run_id, data) {
        Ok(_) => Ok(()),
        // Terminal runs report NotFound; the run finished before the step fired
        Err(RunStoreError::NotFound) if store.get_run(run_id).is_some() => {
            debug!(run.id = %run_id, "Run already terminal, checkpoint skipped");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("raising checkpoint on {run_id}")),
    }
}

/// Complete the run unless it is terminal or gated; both are safe no-ops
fn attempt_completion(store: &RunStore, run_id: &RunId) -> anyhow::Result<()> {
    match store.has_pending_checkpoints(run_id) {
        None => return Err(anyhow!("run {run_id} vanished before completion")),
        Some(true) => {
            debug!(run.id = %run_id, "Completion skipped, checkpoint still pending");
            return Ok(());
        }
        Some(false) => {}
    }

    match store.complete_run(run_id) {
        Ok(_) => Ok(()),
        Err(e) if e.is_benign_race() => {
            debug!(run.id = %run_id, reason = e.reason().as_str(), "Completion skipped");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("completing {run_id}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runs::{CheckpointStatus, RunStatus};
    use crate::scheduler::ManualScheduler;
    use serde_json::json;
    use std::time::Duration;

    fn driver(outcome: SimulatedOutcome) -> (AutomationDriver, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let driver = AutomationDriver::new(
            Arc::new(RunStore::new()),
            scheduler.clone(),
            Arc::new(FixedOutcome(outcome)),
            SimulationTiming {
                progress: DelayRange::fixed(Duration::from_secs(2)),
                completion: DelayRange::fixed(Duration::from_secs(1)),
            },
        );
        (driver, scheduler)
    }

    #[test]
    fn test_start_run_schedules_exactly_one_step() {
        let (driver, scheduler) = driver(SimulatedOutcome::Complete);

        let run = driver.start_run(NewRun::new(json!({"name": "x"}), "trace"));
        assert_eq!(run.status, RunStatus::Created);
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.fire_all(), 1);
        let run = driver.store().get_run(&run.id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.receipt.is_some());
    }

    #[test]
    fn test_checkpoint_path_then_resolution_completes() {
        let (driver, scheduler) = driver(SimulatedOutcome::RaiseCheckpoint);
        let run = driver.start_run(NewRun::new(json!({"name": "x"}), "trace"));

        scheduler.fire_all();
        let pending = driver.store().pending_checkpoints(&run.id);
        assert_eq!(pending.len(), 1);
        assert_eq!(
            driver.store().get_run(&run.id).unwrap().status,
            RunStatus::AwaitingCheckpoint
        );

        driver.resolve_checkpoint(&run.id, &pending[0].id).unwrap();
        assert_eq!(scheduler.pending(), 1);
        scheduler.fire_all();

        let run = driver.store().get_run(&run.id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(driver
            .store()
            .list_checkpoints(Some(CheckpointStatus::Pending))
            .is_empty());
    }

    #[test]
    fn test_resolve_failure_schedules_nothing() {
        let (driver, scheduler) = driver(SimulatedOutcome::Complete);
        let run = driver.start_run(NewRun::new(json!({}), "trace"));

        let result = driver.resolve_checkpoint(&run.id, &CheckpointId::from("cp_never"));
        assert_eq!(result, Err(RunStoreError::NotFound));
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_late_checkpoint_on_completed_run_is_noop() {
        let (driver, scheduler) = driver(SimulatedOutcome::RaiseCheckpoint);
        let run = driver.start_run(NewRun::new(json!({}), "trace"));

        driver.store().complete_run(&run.id).unwrap();
        scheduler.fire_all();

        let run = driver.store().get_run(&run.id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.checkpoints.is_empty());
        assert_eq!(scheduler.metrics().get_stats().failed, 0);
    }

    #[test]
    fn test_completion_attempt_waits_for_second_gate() {
        let (driver, scheduler) = driver(SimulatedOutcome::RaiseCheckpoint);
        let run = driver.start_run(NewRun::new(json!({}), "trace"));
        scheduler.fire_all();

        // A second gate opens before the follow-up completion fires
        let first = driver.store().pending_checkpoints(&run.id).remove(0);
        driver.resolve_checkpoint(&run.id, &first.id).unwrap();
        let second = driver.store().add_checkpoint(&run.id, json!({})).unwrap();
        scheduler.fire_all();

        let paused = driver.store().get_run(&run.id).unwrap();
        assert_eq!(paused.status, RunStatus::AwaitingCheckpoint);
        assert!(paused.receipt.is_none());
        assert_eq!(scheduler.metrics().get_stats().failed, 0);

        driver.resolve_checkpoint(&run.id, &second.id).unwrap();
        scheduler.fire_all();
        assert_eq!(
            driver.store().get_run(&run.id).unwrap().status,
            RunStatus::Completed
        );
    }
}
