// Run Store - single owner of all run and checkpoint state
//
// Every mutation runs its check-then-act inside one write lock so concurrent
// callers (API handlers and scheduled callbacks) observe each other's effects
// atomically. Reads take the shared lock and hand out cloned snapshots.

use super::errors::RunStoreError;
use super::status::{run_status_policy, CheckpointStatus, RunStatus};
use super::types::{Checkpoint, CheckpointId, NewRun, Receipt, Run, RunEventKind, RunId};
use crate::observability::RunMetrics;
use crate::transitions::{SequenceViolation, TransitionPolicy};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct StoreState {
    runs: HashMap<RunId, Run>,
    run_order: Vec<RunId>,
    /// Creation order across all runs
    checkpoints: Vec<Checkpoint>,
    checkpoint_index: HashMap<CheckpointId, usize>,
}

impl StoreState {
    fn has_pending(&self, run: &Run) -> bool {
        run.checkpoints.iter().any(|id| {
            self.checkpoint_index
                .get(id)
                .map(|&idx| self.checkpoints[idx].is_pending())
                .unwrap_or(false)
        })
    }
}

#[derive(Debug)]
pub struct RunStore {
    state: RwLock<StoreState>,
    policy: TransitionPolicy<RunStatus>,
    metrics: Arc<RunMetrics>,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(RunMetrics::new()))
    }

    pub fn with_metrics(metrics: Arc<RunMetrics>) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            policy: run_status_policy(),
            metrics,
        }
    }

    pub fn policy(&self) -> &TransitionPolicy<RunStatus> {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<RunMetrics> {
        &self.metrics
    }

    pub fn create_run(&self, request: NewRun) -> Run {
        let run = Run::new(request, Utc::now());

        let mut state = self.state.write();
        state.run_order.push(run.id.clone());
        state.runs.insert(run.id.clone(), run.clone());
        drop(state);

        self.metrics.record_run_created();
        info!(
            run.id = %run.id,
            trace.id = %run.trace_id,
            service = ?run.service_slug,
            "Run created"
        );
        run
    }

    pub fn get_run(&self, run_id: &RunId) -> Option<Run> {
        self.state.read().runs.get(run_id).cloned()
    }

    /// All runs in creation order, optionally narrowed to one status
    pub fn list_runs(&self, status: Option<RunStatus>) -> Vec<Run> {
        let state = self.state.read();
        state
            .run_order
            .iter()
            .filter_map(|id| state.runs.get(id))
            .filter(|run| status.map_or(true, |s| run.status == s))
            .cloned()
            .collect()
    }

    pub fn get_checkpoint(&self, checkpoint_id: &CheckpointId) -> Option<Checkpoint> {
        let state = self.state.read();
        state
            .checkpoint_index
            .get(checkpoint_id)
            .map(|&idx| state.checkpoints[idx].clone())
    }

    /// Checkpoints across every run in creation order
    pub fn list_checkpoints(&self, status: Option<CheckpointStatus>) -> Vec<Checkpoint> {
        self.state
            .read()
            .checkpoints
            .iter()
            .filter(|cp| status.map_or(true, |s| cp.status == s))
            .cloned()
            .collect()
    }

    pub fn pending_checkpoints(&self, run_id: &RunId) -> Vec<Checkpoint> {
        self.state
            .read()
            .checkpoints
            .iter()
            .filter(|cp| &cp.run_id == run_id && cp.is_pending())
            .cloned()
            .collect()
    }

    /// `None` when the run does not exist
    pub fn has_pending_checkpoints(&self, run_id: &RunId) -> Option<bool> {
        let state = self.state.read();
        state.runs.get(run_id).map(|run| state.has_pending(run))
    }

    /// Raise a human-in-the-loop gate on a run.
    ///
    /// Terminal runs are reported as not found: they can no longer grow
    /// checkpoints. A run already paused may take further checkpoints.
    pub fn add_checkpoint(
        &self,
        run_id: &RunId,
        data: serde_json::Value,
    ) -> Result<Checkpoint, RunStoreError> {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let run = match state.runs.get_mut(run_id) {
            Some(run) if !run.is_terminal() => run,
            Some(run) => {
                debug!(run.id = %run_id, status = %run.status, "Checkpoint refused on terminal run");
                return Err(self.reject("add_checkpoint", run_id, RunStoreError::NotFound));
            }
            None => return Err(self.reject("add_checkpoint", run_id, RunStoreError::NotFound)),
        };

        let from = run.status;
        let to = RunStatus::AwaitingCheckpoint;
        if !self.policy.is_allowed(&from, &to) {
            return Err(self.reject(
                "add_checkpoint",
                run_id,
                RunStoreError::IllegalTransition { from, to },
            ));
        }

        let checkpoint = Checkpoint::new(run_id.clone(), data, now);
        run.checkpoints.push(checkpoint.id.clone());
        run.status = to;
        run.record(
            RunEventKind::CheckpointAdded,
            now,
            Some(checkpoint.id.clone()),
            None,
        );

        state
            .checkpoint_index
            .insert(checkpoint.id.clone(), state.checkpoints.len());
        state.checkpoints.push(checkpoint.clone());
        drop(guard);

        self.metrics.record_checkpoint_added();
        info!(
            run.id = %run_id,
            checkpoint.id = %checkpoint.id,
            from = %from,
            "Checkpoint added, run awaiting resolution"
        );
        Ok(checkpoint)
    }

    /// Mark one checkpoint resolved.
    ///
    /// Does not complete the run. When the last pending checkpoint closes the
    /// run resumes to `Created`, which makes it eligible for completion.
    pub fn resolve_checkpoint(
        &self,
        run_id: &RunId,
        checkpoint_id: &CheckpointId,
    ) -> Result<(), RunStoreError> {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let idx = match (
            state.runs.contains_key(run_id),
            state.checkpoint_index.get(checkpoint_id),
        ) {
            (true, Some(&idx)) if &state.checkpoints[idx].run_id == run_id => idx,
            _ => {
                return Err(self.reject(
                    "resolve_checkpoint",
                    run_id,
                    RunStoreError::NotFound,
                ))
            }
        };

        let checkpoint = &mut state.checkpoints[idx];
        if checkpoint.status == CheckpointStatus::Resolved {
            return Err(self.reject(
                "resolve_checkpoint",
                run_id,
                RunStoreError::AlreadyResolved,
            ));
        }
        checkpoint.status = CheckpointStatus::Resolved;
        checkpoint.resolved_at = Some(now);

        let still_pending = state
            .runs
            .get(run_id)
            .map(|run| state.has_pending(run))
            .unwrap_or(false);

        let Some(run) = state.runs.get_mut(run_id) else {
            return Err(RunStoreError::NotFound);
        };
        run.record(
            RunEventKind::CheckpointResolved,
            now,
            Some(checkpoint_id.clone()),
            None,
        );

        let resumed = !still_pending
            && run.status == RunStatus::AwaitingCheckpoint
            && self.policy.is_allowed(&run.status, &RunStatus::Created);
        if resumed {
            run.status = RunStatus::Created;
            run.record(RunEventKind::RunResumed, now, None, None);
        }
        drop(guard);

        self.metrics.record_checkpoint_resolved();
        info!(
            run.id = %run_id,
            checkpoint.id = %checkpoint_id,
            resumed,
            "Checkpoint resolved"
        );
        Ok(())
    }

    /// Complete a run and issue its receipt.
    ///
    /// Repeated calls are rejected with `AlreadyTerminal` and leave the first
    /// receipt in place.
    pub fn complete_run(&self, run_id: &RunId) -> Result<Receipt, RunStoreError> {
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let Some(run) = state.runs.get(run_id) else {
            return Err(self.reject("complete_run", run_id, RunStoreError::NotFound));
        };
        if run.is_terminal() {
            return Err(self.reject("complete_run", run_id, RunStoreError::AlreadyTerminal));
        }
        if state.has_pending(run) {
            return Err(self.reject("complete_run", run_id, RunStoreError::CheckpointPending));
        }
        let from = run.status;
        let to = RunStatus::Completed;
        if !self.policy.is_allowed(&from, &to) {
            return Err(self.reject(
                "complete_run",
                run_id,
                RunStoreError::IllegalTransition { from, to },
            ));
        }

        let Some(run) = state.runs.get_mut(run_id) else {
            return Err(RunStoreError::NotFound);
        };
        let receipt = Receipt::issue(now);
        run.status = to;
        run.receipt = Some(receipt.clone());
        run.record(
            RunEventKind::RunCompleted,
            now,
            None,
            Some(receipt.confirmation.clone()),
        );
        drop(guard);

        self.metrics.record_run_completed();
        info!(
            run.id = %run_id,
            confirmation = %receipt.confirmation,
            "Run completed"
        );
        Ok(receipt)
    }

    /// Move a run into `Failed`, e.g. for manual recovery after a simulation
    /// error. Open checkpoints are left as they are.
    pub fn fail_run(&self, run_id: &RunId, reason: impl Into<String>) -> Result<(), RunStoreError> {
        let reason = reason.into();
        let now = Utc::now();
        let mut state = self.state.write();

        let Some(run) = state.runs.get_mut(run_id) else {
            return Err(self.reject("fail_run", run_id, RunStoreError::NotFound));
        };
        if run.is_terminal() {
            return Err(self.reject("fail_run", run_id, RunStoreError::AlreadyTerminal));
        }
        let from = run.status;
        let to = RunStatus::Failed;
        if !self.policy.is_allowed(&from, &to) {
            return Err(self.reject(
                "fail_run",
                run_id,
                RunStoreError::IllegalTransition { from, to },
            ));
        }

        run.status = to;
        run.failure = Some(reason.clone());
        run.record(RunEventKind::RunFailed, now, None, Some(reason.clone()));
        drop(state);

        self.metrics.record_run_failed();
        info!(run.id = %run_id, reason = %reason, "Run failed");
        Ok(())
    }

    /// Replay a run's recorded status history through the transition policy.
    ///
    /// Returns `None` for an unknown run, otherwise the first violation found.
    pub fn audit_run(&self, run_id: &RunId) -> Option<Result<(), SequenceViolation<RunStatus>>> {
        let history = self.state.read().runs.get(run_id)?.status_history();
        Some(self.policy.validate_sequence(&history))
    }

    pub fn len(&self) -> usize {
        self.state.read().runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reject(&self, operation: &str, run_id: &RunId, error: RunStoreError) -> RunStoreError {
        self.metrics.record_rejection();
        debug!(
            operation,
            run.id = %run_id,
            reason = error.reason().as_str(),
            "Run store mutation rejected"
        );
        error
    }
}
