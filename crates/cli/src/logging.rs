use crate::error::CliError;
use std::{fs, path::Path, sync::Arc};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes tracing: stdout always, plus a timestamped append-only
/// log file when `log_dir` is given.
pub fn init(filter: &str, log_dir: Option<&Path>) -> Result<(), CliError> {
    let env_filter = EnvFilter::try_new(filter)
        .map_err(|e| CliError::Unexpected(format!("invalid log filter '{filter}': {e}")))?;

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer());

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_name = format!(
                "migration_{}.log",
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            );
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(file_name))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}
