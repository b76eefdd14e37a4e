// Core records owned by the run store

use super::status::{CheckpointStatus, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        Self(format!("run_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RunId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(pub String);

impl CheckpointId {
    pub fn generate() -> Self {
        Self(format!("cp_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CheckpointId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Input captured when a run is created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRun {
    pub service_slug: Option<String>,
    pub version: Option<String>,
    pub submission_mode: Option<String>,
    /// Form values, shape checked by the caller
    pub values: serde_json::Value,
    pub trace_id: String,
}

impl NewRun {
    pub fn new(values: serde_json::Value, trace_id: impl Into<String>) -> Self {
        Self {
            values,
            trace_id: trace_id.into(),
            ..Default::default()
        }
    }

    pub fn with_service(mut self, slug: impl Into<String>, version: impl Into<String>) -> Self {
        self.service_slug = Some(slug.into());
        self.version = Some(version.into());
        self
    }

    pub fn with_submission_mode(mut self, mode: impl Into<String>) -> Self {
        self.submission_mode = Some(mode.into());
        self
    }
}

/// Proof of completion, issued exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub confirmation: String,
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    pub fn issue(now: DateTime<Utc>) -> Self {
        let token = Uuid::new_v4().simple().to_string().to_uppercase();
        Self {
            confirmation: format!("CONF-{}", &token[..10]),
            issued_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    RunCreated,
    CheckpointAdded,
    CheckpointResolved,
    /// Last pending checkpoint resolved, run back in progress
    RunResumed,
    RunCompleted,
    RunFailed,
}

/// One entry of a run's append-only audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    #[serde(rename = "type")]
    pub kind: RunEventKind,
    pub at: DateTime<Utc>,
    /// Run status once this event was applied
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub service_slug: Option<String>,
    pub version: Option<String>,
    pub submission_mode: Option<String>,
    pub values: serde_json::Value,
    pub trace_id: String,
    pub receipt: Option<Receipt>,
    pub failure: Option<String>,
    pub checkpoints: Vec<CheckpointId>,
    pub events: Vec<RunEvent>,
}

impl Run {
    pub(crate) fn new(request: NewRun, now: DateTime<Utc>) -> Self {
        let mut run = Self {
            id: RunId::generate(),
            status: RunStatus::Created,
            created_at: now,
            updated_at: now,
            service_slug: request.service_slug,
            version: request.version,
            submission_mode: request.submission_mode,
            values: request.values,
            trace_id: request.trace_id,
            receipt: None,
            failure: None,
            checkpoints: Vec::new(),
            events: Vec::new(),
        };
        run.record(RunEventKind::RunCreated, now, None, None);
        run
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Status after each status-bearing event, collapsing repeats.
    ///
    /// Self-transitions (a second checkpoint while already paused) are kept so
    /// the history replays exactly what the store validated.
    pub fn status_history(&self) -> Vec<RunStatus> {
        let mut history = Vec::with_capacity(self.events.len());
        let mut last = None;
        for event in &self.events {
            let changes_status = matches!(
                event.kind,
                RunEventKind::RunCreated
                    | RunEventKind::CheckpointAdded
                    | RunEventKind::RunResumed
                    | RunEventKind::RunCompleted
                    | RunEventKind::RunFailed
            );
            if changes_status || last != Some(event.status) {
                history.push(event.status);
                last = Some(event.status);
            }
        }
        history
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    pub(crate) fn record(
        &mut self,
        kind: RunEventKind,
        now: DateTime<Utc>,
        checkpoint_id: Option<CheckpointId>,
        detail: Option<String>,
    ) {
        self.touch(now);
        self.events.push(RunEvent {
            kind,
            at: self.updated_at,
            status: self.status,
            checkpoint_id,
            detail,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub run_id: RunId,
    pub status: CheckpointStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// What needs human attention, e.g. the step or field that paused the run
    pub data: serde_json::Value,
}

impl Checkpoint {
    pub(crate) fn new(run_id: RunId, data: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            id: CheckpointId::generate(),
            run_id,
            status: CheckpointStatus::Pending,
            created_at: now,
            resolved_at: None,
            data,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == CheckpointStatus::Pending
    }
}
