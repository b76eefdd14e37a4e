use automation_runs::RunStatus;
use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "automation-runs")]
#[command(about = "Simulated form-submission runs with human-in-the-loop checkpoints")]
#[command(long_about = "Drives simulated browser-automation runs through their lifecycle: runs are \
                       created, may pause on checkpoints that need human review, and complete with \
                       a receipt. Start with 'automation-runs simulate' to watch a batch of runs.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a batch of simulated runs and follow them to completion
    Simulate {
        /// Number of runs to start
        #[arg(long, default_value = "5", help = "How many runs to start")]
        runs: usize,
        /// Service slug recorded on each run
        #[arg(long, default_value = "benefits-application", help = "Service slug recorded on each run")]
        service: String,
        /// Override the configured checkpoint probability
        #[arg(long, help = "Chance (0.0-1.0) that a run pauses for review")]
        checkpoint_probability: Option<f64>,
        /// Leave checkpoints open instead of approving them
        #[arg(long, help = "Do not resolve checkpoints; paused runs stay paused")]
        no_resolve: bool,
        /// Print the final runs as JSON
        #[arg(long, help = "Dump final run records as JSON")]
        json: bool,
    },
    /// Check a run status history against the lifecycle policy
    Audit {
        /// Statuses in the order they were observed
        #[arg(required = true, help = "e.g. created awaiting_checkpoint created completed")]
        statuses: Vec<RunStatus>,
    },
    /// Print the run lifecycle transition table
    Policy,
}
