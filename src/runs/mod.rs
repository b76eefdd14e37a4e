// Automation runs - records, lifecycle and the in-memory store that owns them

pub mod errors;
pub mod status;
pub mod store;
pub mod types;

pub use errors::{FailureReason, MutationOutcome, RunStoreError};
pub use status::{run_status_policy, CheckpointStatus, RunStatus};
pub use store::RunStore;
pub use types::{Checkpoint, CheckpointId, NewRun, Receipt, Run, RunEvent, RunEventKind, RunId};
