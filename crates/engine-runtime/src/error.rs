use connectors::error::SourceError;
use engine_config::error::SettingsError;
use thiserror::Error;

/// Top-level errors for a migration run. Per-table failures never show
/// up here; they land in the run report so the remaining tables keep
/// going.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Source connection error: {0}")]
    Source(#[from] SourceError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
