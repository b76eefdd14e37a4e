use anyhow::Result;
use automation_runs::{run_status_policy, RunStatus};

pub struct PolicyCommand;

impl PolicyCommand {
    pub fn execute(&self) -> Result<()> {
        let policy = run_status_policy();

        println!("📋 Run lifecycle transitions:");
        for from in RunStatus::ALL {
            let successors: Vec<&str> = RunStatus::ALL
                .iter()
                .filter(|to| policy.is_allowed(&from, to))
                .map(|to| to.as_str())
                .collect();
            if successors.is_empty() {
                println!("   {:<20} (terminal)", from.as_str());
            } else {
                println!("   {:<20} -> {}", from.as_str(), successors.join(", "));
            }
        }
        println!();
        println!("💡 Completion is also refused while any checkpoint is pending");
        Ok(())
    }
}
