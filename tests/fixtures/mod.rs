#![allow(dead_code)]

// Shared fixtures for run store and driver integration tests
use automation_runs::{
    AutomationDriver, DelayRange, FixedOutcome, ManualScheduler, NewRun, Run, RunStore,
    SimulatedOutcome, SimulationTiming, TokioScheduler,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const PROGRESS_DELAY: Duration = Duration::from_secs(2);
pub const COMPLETION_DELAY: Duration = Duration::from_secs(1);

/// Minimal form submission with a single field
pub fn sample_request() -> NewRun {
    NewRun::new(json!({ "name": "x" }), "trace-fixture")
        .with_service("benefits-application", "v1")
        .with_submission_mode("automatic")
}

pub fn store_with_run() -> (Arc<RunStore>, Run) {
    let store = Arc::new(RunStore::new());
    let run = store.create_run(sample_request());
    (store, run)
}

pub fn fixed_timing() -> SimulationTiming {
    SimulationTiming {
        progress: DelayRange::fixed(PROGRESS_DELAY),
        completion: DelayRange::fixed(COMPLETION_DELAY),
    }
}

/// Driver on a virtual clock that always takes `outcome`
pub fn manual_driver(outcome: SimulatedOutcome) -> (AutomationDriver, Arc<ManualScheduler>) {
    let scheduler = Arc::new(ManualScheduler::new());
    let driver = AutomationDriver::new(
        Arc::new(RunStore::new()),
        scheduler.clone(),
        Arc::new(FixedOutcome(outcome)),
        fixed_timing(),
    );
    (driver, scheduler)
}

/// Driver on tokio timers; must be called inside a runtime
pub fn tokio_driver(outcome: SimulatedOutcome) -> (AutomationDriver, TokioScheduler) {
    let scheduler = TokioScheduler::try_current().expect("tokio runtime required");
    let driver = AutomationDriver::new(
        Arc::new(RunStore::new()),
        Arc::new(scheduler.clone()),
        Arc::new(FixedOutcome(outcome)),
        fixed_timing(),
    );
    (driver, scheduler)
}
