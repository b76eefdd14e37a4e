// Automation Runs Library - simulated form-submission runs with review checkpoints
// This exposes the core components for testing and integration

pub mod config;
pub mod driver;
pub mod observability;
pub mod runs;
pub mod scheduler;
pub mod shutdown;
pub mod telemetry;
pub mod transitions;

// Re-export key types for easy access
pub use config::{config, init_config, OrchestratorConfig, SimulationConfig};
pub use driver::{
    AutomationDriver, FixedOutcome, OutcomeStrategy, RandomOutcome, SimulatedOutcome,
    SimulationTiming,
};
pub use observability::{OperationTimer, RunMetrics, SchedulerMetrics};
pub use runs::{
    run_status_policy, Checkpoint, CheckpointId, CheckpointStatus, FailureReason,
    MutationOutcome, NewRun, Receipt, Run, RunEvent, RunEventKind, RunId, RunStatus, RunStore,
    RunStoreError,
};
pub use scheduler::{DelayRange, ManualScheduler, Scheduler, TokioScheduler, Work};
pub use shutdown::ShutdownCoordinator;
pub use telemetry::{create_run_span, generate_trace_id, init_telemetry, shutdown_telemetry};
pub use transitions::{SequenceViolation, TransitionPolicy};
