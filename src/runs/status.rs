use crate::transitions::TransitionPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a single automation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run accepted, automation in progress
    Created,
    /// Paused on at least one pending checkpoint
    AwaitingCheckpoint,
    /// Form submitted, receipt issued
    Completed,
    /// Run abandoned
    Failed,
}

impl RunStatus {
    pub const ALL: [RunStatus; 4] = [
        RunStatus::Created,
        RunStatus::AwaitingCheckpoint,
        RunStatus::Completed,
        RunStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Created => "created",
            RunStatus::AwaitingCheckpoint => "awaiting_checkpoint",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown run status '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Pending,
    Resolved,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::Pending => "pending",
            CheckpointStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CheckpointStatus::Pending),
            "resolved" => Ok(CheckpointStatus::Resolved),
            other => Err(format!("unknown checkpoint status '{other}'")),
        }
    }
}

/// Legal run status moves.
///
/// `AwaitingCheckpoint -> AwaitingCheckpoint` covers a second gate raised while
/// the first is still open, and `AwaitingCheckpoint -> Created` is the resume
/// edge taken when the last pending checkpoint is resolved. Whether completion
/// is blocked by open checkpoints is decided by the store, not by this table.
pub fn run_status_policy() -> TransitionPolicy<RunStatus> {
    TransitionPolicy::new()
        .allow(
            RunStatus::Created,
            [
                RunStatus::AwaitingCheckpoint,
                RunStatus::Completed,
                RunStatus::Failed,
            ],
        )
        .allow(
            RunStatus::AwaitingCheckpoint,
            [
                RunStatus::AwaitingCheckpoint,
                RunStatus::Created,
                RunStatus::Completed,
                RunStatus::Failed,
            ],
        )
        .terminal(RunStatus::Completed)
        .terminal(RunStatus::Failed)
}
