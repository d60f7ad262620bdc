use engine_config::error::SettingsError;
use engine_runtime::error::MigrationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the configuration file: {0}")]
    ConfigFileRead(#[from] std::io::Error),

    #[error("Invalid migration plan: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to run the migration: {0}")]
    Runner(#[from] MigrationError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(serde_json::Error),

    #[error("Invalid connection format provided: {0}")]
    InvalidConnectionFormat(String),

    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
