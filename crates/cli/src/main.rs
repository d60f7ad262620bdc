use crate::{
    conn::{ConnectionKind, ConnectionPinger, MySqlConnectionPinger, PostgresConnectionPinger},
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use engine_config::plan::MigrationPlan;
use engine_runtime::{
    error::MigrationError,
    execution::executor::{self, RunOptions},
};
use std::{path::PathBuf, str::FromStr};
use tokio_util::sync::CancellationToken;
use tracing::error;

mod commands;
mod conn;
mod error;
mod logging;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "cloudlift",
    version = "0.1.0",
    about = "Batch migration of relational tables to cloud object storage"
)]
struct Cli {
    /// Log filter, e.g. "info" or "cloudlift=debug"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write a timestamped log file into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(&cli.log_level, cli.log_dir.as_deref()) {
        eprintln!("Failed to initialize logging: {err}");
        return std::process::ExitCode::from(ExitCode::GeneralError.as_u8());
    }

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(CliError::Runner(MigrationError::ShutdownRequested)) => {
            error!("Migration interrupted by shutdown request");
            ExitCode::ShutdownRequested
        }
        Err(err) => {
            error!("{err}");
            ExitCode::GeneralError
        }
    };
    std::process::ExitCode::from(code.as_u8())
}

async fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Migrate {
            config,
            tables,
            dry_run,
            output,
        } => {
            let plan = load_plan(&config).await?;
            let options = RunOptions {
                dry_run,
                validate_only: false,
                tables: none_if_empty(tables),
            };
            run_and_report(plan, options, output).await
        }
        Commands::Validate {
            config,
            tables,
            output,
        } => {
            let plan = load_plan(&config).await?;
            let options = RunOptions {
                dry_run: false,
                validate_only: true,
                tables: none_if_empty(tables),
            };
            run_and_report(plan, options, output).await
        }
        Commands::Plan { config } => {
            let plan = load_plan(&config).await?;
            plan.validate()?;
            let json = serde_json::to_string_pretty(&plan).map_err(CliError::JsonSerialize)?;
            println!("{json}");
            Ok(ExitCode::Success)
        }
        Commands::TestConn { format, conn_str } => {
            let kind = ConnectionKind::from_str(&format)
                .map_err(|_| CliError::InvalidConnectionFormat(format))?;
            match kind {
                ConnectionKind::MySql => {
                    MySqlConnectionPinger { conn_str }.ping().await?;
                }
                ConnectionKind::Postgres => {
                    PostgresConnectionPinger { conn_str }.ping().await?;
                }
            }
            Ok(ExitCode::Success)
        }
    }
}

async fn run_and_report(
    plan: MigrationPlan,
    options: RunOptions,
    output: Option<String>,
) -> Result<ExitCode, CliError> {
    let cancel = CancellationToken::new();
    let coordinator = ShutdownCoordinator::new(cancel.clone());
    coordinator.register_handlers();

    let report = executor::run(plan, options, cancel).await?;

    match output {
        Some(path) => output::write_report(&report, path).await?,
        None => output::print_report(&report)?,
    }

    if report.all_passed {
        Ok(ExitCode::Success)
    } else {
        error!(failed = ?report.failed_tables(), "Run finished with failing tables");
        Ok(ExitCode::GeneralError)
    }
}

async fn load_plan(path: &str) -> Result<MigrationPlan, CliError> {
    let source = tokio::fs::read_to_string(path).await?;
    Ok(engine_config::plan::parse(&source)?)
}

fn none_if_empty(tables: Vec<String>) -> Option<Vec<String>> {
    if tables.is_empty() { None } else { Some(tables) }
}
