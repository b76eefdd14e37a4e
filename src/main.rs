use anyhow::Result;
use clap::Parser;

mod cli;

use automation_runs::{config, init_config, init_telemetry, shutdown_telemetry};
use cli::commands::{show_usage, AuditCommand, PolicyCommand, SimulateCommand};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config()?;
    init_telemetry(&config.observability)?;
    init_config()?;

    let result = match cli.command {
        None => show_usage(),
        Some(Commands::Simulate {
            runs,
            service,
            checkpoint_probability,
            no_resolve,
            json,
        }) => {
            let command = SimulateCommand {
                runs,
                service,
                checkpoint_probability,
                resolve_checkpoints: !no_resolve,
                json,
            };
            tokio::runtime::Runtime::new()?.block_on(async { command.execute(config).await })
        }
        Some(Commands::Audit { statuses }) => AuditCommand::new(statuses).execute(),
        Some(Commands::Policy) => PolicyCommand.execute(),
    };

    shutdown_telemetry();
    result
}
