use connectors::error::{CodecError, SourceError, StoreError, TransferError};
use thiserror::Error;

/// Extraction failures. All of them are fatal for the table they name
/// and non-fatal for the run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Source unavailable for table '{table}': {source}")]
    SourceUnavailable {
        table: String,
        #[source]
        source: SourceError,
    },

    #[error(
        "Failed to write batch {index} for table '{table}' after {attempts} attempt(s): {source}"
    )]
    DestinationWrite {
        table: String,
        index: u32,
        attempts: usize,
        #[source]
        source: StoreError,
    },

    #[error("Failed to encode batch {index} for table '{table}': {source}")]
    Encode {
        table: String,
        index: u32,
        #[source]
        source: CodecError,
    },

    #[error("Extraction cancelled for table '{table}'")]
    Cancelled { table: String },
}

/// Submission is not retried: a rejected submission almost always means
/// a configuration problem, not a transient fault.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Failed to submit transfer job for table '{table}': {source}")]
    Submission {
        table: String,
        #[source]
        source: TransferError,
    },
}

/// Internal validation failures; the validator converts them into a
/// failed `ValidationResult` instead of surfacing them to the caller.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("Source query failed: {0}")]
    Source(#[from] SourceError),

    #[error("Destination listing or read failed: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed destination object: {0}")]
    Decode(#[from] CodecError),

    #[error("Count query returned no rows")]
    EmptyCount,

    #[error("Count query returned a non-numeric value: {0}")]
    BadCount(String),
}
