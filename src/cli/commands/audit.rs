use anyhow::{bail, Result};
use automation_runs::{run_status_policy, RunStatus};

pub struct AuditCommand {
    pub statuses: Vec<RunStatus>,
}

impl AuditCommand {
    pub fn new(statuses: Vec<RunStatus>) -> Self {
        Self { statuses }
    }

    pub fn execute(&self) -> Result<()> {
        let rendered: Vec<&str> = self.statuses.iter().map(|s| s.as_str()).collect();
        println!("🔍 Auditing: {}", rendered.join(" -> "));

        match run_status_policy().validate_sequence(&self.statuses) {
            Ok(()) => {
                println!("✅ Every transition is allowed");
                Ok(())
            }
            Err(violation) => {
                println!(
                    "❌ Step {} is illegal: {} -> {}",
                    violation.index, violation.from, violation.to
                );
                bail!(violation)
            }
        }
    }
}
