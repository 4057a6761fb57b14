use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use updata::cli::commands::{GraphCommand, Locations, RunCommand, ShowConfigCommand, StatusCommand};
use updata::cli::{Cli, Commands};
use updata::{init_telemetry, Outcome, UpdataConfig};

/// Operational failure: marker I/O, executor could not be started. The
/// scheduler retries.
const EXIT_OPERATIONAL_ERROR: u8 = 1;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("updata failed: {e:#}");
            eprintln!("❌ {e:#}");
            ExitCode::from(EXIT_OPERATIONAL_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let _ = UpdataConfig::load_env_file();
    let config = UpdataConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run {
        plan: None,
        marker_dir: None,
    }) {
        // Default behavior: no subcommand runs the update
        Commands::Run { plan, marker_dir } => {
            init_telemetry(&config.observability)?;
            let command = RunCommand::new(Locations::resolve(&config, plan, marker_dir));
            let outcome: Outcome = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(command.execute(&config))?;
            Ok(outcome.into())
        }
        Commands::Status {
            plan,
            marker_dir,
            json,
        } => {
            StatusCommand::new(Locations::resolve(&config, plan, marker_dir), json).execute()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Graph { format } => {
            GraphCommand::new(format).execute()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            ShowConfigCommand.execute(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
