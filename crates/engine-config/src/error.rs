use thiserror::Error;

/// Errors raised while parsing or validating a migration plan. All of
/// them surface before any table work starts.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse migration plan: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("The plan lists no tables to migrate")]
    NoTables,

    #[error("Duplicate table in plan: {0}")]
    DuplicateTable(String),

    #[error("Transfer mode is 'managed' but no transfer endpoint is configured")]
    MissingTransferEndpoint,
}
