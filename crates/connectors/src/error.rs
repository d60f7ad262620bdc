use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid connection url: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// The query ran but its result did not have the shape the caller
    /// required (e.g. an empty count result).
    #[error("Query returned an unexpected shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("HTTP store error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed batch object: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Transfer service HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transfer service protocol error: {0}")]
    Protocol(String),
}
