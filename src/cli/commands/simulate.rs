use anyhow::Result;
use automation_runs::{
    generate_trace_id, AutomationDriver, CheckpointStatus, NewRun, OperationTimer,
    OrchestratorConfig, RunStatus, RunStore, RunStoreError, ShutdownCoordinator, TokioScheduler,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct SimulateCommand {
    pub runs: usize,
    pub service: String,
    pub checkpoint_probability: Option<f64>,
    pub resolve_checkpoints: bool,
    pub json: bool,
}

impl SimulateCommand {
    pub async fn execute(&self, config: &OrchestratorConfig) -> Result<()> {
        let mut simulation = config.simulation.clone();
        if let Some(probability) = self.checkpoint_probability {
            simulation.checkpoint_probability = probability;
        }

        let store = Arc::new(RunStore::new());
        let scheduler = TokioScheduler::try_current()?;
        let driver =
            AutomationDriver::from_config(Arc::clone(&store), Arc::new(scheduler.clone()), &simulation);

        println!(
            "▶️  Starting {} run(s) for '{}' (checkpoint chance {:.0}%)",
            self.runs,
            self.service,
            simulation.checkpoint_probability.clamp(0.0, 1.0) * 100.0
        );
        let timer = OperationTimer::new("simulate");

        for i in 0..self.runs {
            let request = NewRun::new(
                json!({ "applicant": format!("applicant-{:03}", i + 1) }),
                generate_trace_id(),
            )
            .with_service(self.service.as_str(), "v1")
            .with_submission_mode("automatic");
            let run = driver.start_run(request);
            println!("   🆕 {}", run.id);
        }

        loop {
            let open: Vec<_> = store
                .list_runs(None)
                .into_iter()
                .filter(|run| !run.is_terminal())
                .collect();
            if open.is_empty() {
                break;
            }

            let pending = store.list_checkpoints(Some(CheckpointStatus::Pending));
            if self.resolve_checkpoints {
                for checkpoint in pending {
                    match driver.resolve_checkpoint(&checkpoint.run_id, &checkpoint.id) {
                        Ok(()) => println!(
                            "   ✋ Approved checkpoint {} on {}",
                            checkpoint.id, checkpoint.run_id
                        ),
                        Err(RunStoreError::AlreadyResolved) => {}
                        Err(e) => warn!(checkpoint.id = %checkpoint.id, error = %e, "Could not resolve checkpoint"),
                    }
                }
            } else if scheduler.in_flight() == 0
                && open.iter().all(|run| run.status == RunStatus::AwaitingCheckpoint)
            {
                println!("   ⏸️  {} run(s) waiting on review, leaving them open", open.len());
                break;
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
        timer.finish();

        ShutdownCoordinator::new(config.shutdown.drain_timeout())
            .shutdown(&scheduler)
            .await?;

        println!();
        println!("📊 Results:");
        for run in store.list_runs(None) {
            let confirmation = run
                .receipt
                .as_ref()
                .map(|receipt| receipt.confirmation.as_str())
                .unwrap_or("-");
            let audit = match store.audit_run(&run.id) {
                Some(Ok(())) => "✅",
                _ => "❌",
            };
            println!(
                "   {} {:<20} receipt={:<15} checkpoints={} events={} audit={}",
                run.id,
                run.status.as_str(),
                confirmation,
                run.checkpoints.len(),
                run.events.len(),
                audit
            );
        }

        let stats = store.metrics().get_stats();
        println!();
        println!(
            "   created={} completed={} checkpoints={} resolved={} rejected={}",
            stats.runs_created,
            stats.runs_completed,
            stats.checkpoints_added,
            stats.checkpoints_resolved,
            stats.rejected_mutations
        );
        store.metrics().log_stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&store.list_runs(None))?);
        }
        Ok(())
    }
}
