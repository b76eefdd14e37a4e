use super::status::RunStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a run store mutation was rejected.
///
/// The set is closed: callers branch on the variant (or on `reason()` at a
/// transport boundary) instead of inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunStoreError {
    #[error("run or checkpoint not found")]
    NotFound,

    #[error("checkpoint already resolved")]
    AlreadyResolved,

    #[error("run already reached a terminal status")]
    AlreadyTerminal,

    #[error("run has a pending checkpoint")]
    CheckpointPending,

    #[error("illegal run transition {from} -> {to}")]
    IllegalTransition { from: RunStatus, to: RunStatus },
}

impl RunStoreError {
    pub fn reason(&self) -> FailureReason {
        match self {
            RunStoreError::NotFound => FailureReason::NotFound,
            RunStoreError::AlreadyResolved => FailureReason::AlreadyResolved,
            RunStoreError::AlreadyTerminal => FailureReason::AlreadyTerminal,
            RunStoreError::CheckpointPending => FailureReason::CheckpointPending,
            RunStoreError::IllegalTransition { .. } => FailureReason::IllegalTransition,
        }
    }

    /// Rejections that a late scheduled callback is expected to hit when a
    /// caller or another callback got there first
    pub fn is_benign_race(&self) -> bool {
        matches!(
            self,
            RunStoreError::AlreadyResolved
                | RunStoreError::AlreadyTerminal
                | RunStoreError::CheckpointPending
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    AlreadyResolved,
    AlreadyTerminal,
    CheckpointPending,
    IllegalTransition,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "not_found",
            FailureReason::AlreadyResolved => "already_resolved",
            FailureReason::AlreadyTerminal => "already_terminal",
            FailureReason::CheckpointPending => "checkpoint_pending",
            FailureReason::IllegalTransition => "illegal_transition",
        }
    }
}

/// `{ok, reason}` shape for adapters that report mutations over a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl MutationOutcome {
    pub fn success() -> Self {
        Self { ok: true, reason: None }
    }

    pub fn failure(error: RunStoreError) -> Self {
        Self {
            ok: false,
            reason: Some(error.reason()),
        }
    }
}

impl<T> From<Result<T, RunStoreError>> for MutationOutcome {
    fn from(result: Result<T, RunStoreError>) -> Self {
        match result {
            Ok(_) => MutationOutcome::success(),
            Err(e) => MutationOutcome::failure(e),
        }
    }
}
