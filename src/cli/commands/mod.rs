use anyhow::Result;

pub mod audit;
pub mod policy;
pub mod simulate;

pub use audit::AuditCommand;
pub use policy::PolicyCommand;
pub use simulate::SimulateCommand;

pub fn show_usage() -> Result<()> {
    println!("🤖 Automation Runs - simulated form submission with review checkpoints");
    println!();
    println!("Commands:");
    println!("  ▶️  automation-runs simulate   # Start runs and follow them to completion");
    println!("  🔍 automation-runs audit      # Validate a status history");
    println!("  📋 automation-runs policy     # Show the lifecycle transition table");
    println!();
    println!("💡 Try 'automation-runs simulate --runs 10 --checkpoint-probability 0.5'");
    Ok(())
}
