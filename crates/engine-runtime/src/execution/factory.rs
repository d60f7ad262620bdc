use crate::error::MigrationError;
use connectors::{
    memory::MemorySource,
    source::SourceConnection,
    sql::{mysql::MySqlSource, postgres::PostgresSource},
    store::{ObjectStore, fs::FsObjectStore, http::HttpObjectStore, memory::MemoryObjectStore},
    transfer::{TransferService, http::HttpTransferService},
};
use engine_config::plan::{SourceConfig, StoreConfig, TransferConfig};
use std::sync::Arc;
use tracing::info;

/// Opens a fresh source connection. The executor calls this once per
/// concurrently migrated table; connections are never shared across
/// tables.
pub async fn connect_source(
    config: &SourceConfig,
) -> Result<Box<dyn SourceConnection>, MigrationError> {
    match config {
        SourceConfig::Postgres { url } => Ok(Box::new(PostgresSource::connect(url).await?)),
        SourceConfig::Mysql { url } => Ok(Box::new(MySqlSource::connect(url).await?)),
        SourceConfig::Memory { columns, rows } => Ok(Box::new(MemorySource::from_json_rows(
            "memory",
            columns.clone(),
            rows,
        ))),
    }
}

pub fn create_store(config: &StoreConfig, dry_run: bool) -> Arc<dyn ObjectStore> {
    if dry_run {
        info!("Dry run: destination writes go to an in-memory store");
        return Arc::new(MemoryObjectStore::new());
    }

    match config {
        StoreConfig::Fs { root } => Arc::new(FsObjectStore::new(root.clone())),
        StoreConfig::Http { endpoint } => Arc::new(HttpObjectStore::new(endpoint)),
    }
}

pub fn create_transfer(config: &TransferConfig) -> Arc<dyn TransferService> {
    Arc::new(HttpTransferService::new(&config.endpoint))
}
