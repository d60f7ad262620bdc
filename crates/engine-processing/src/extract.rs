use crate::{error::ExtractError, retry::classify_store_error};
use connectors::{codec, source::SourceConnection, store::ObjectStore};
use engine_core::{metrics::Metrics, retry::RetryPolicy};
use model::{records::batch::Batch, source::TableSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionOutcome {
    pub batches_written: u32,
    pub rows_written: u64,
}

/// Reads one table through a forward-only cursor and writes each batch
/// as an immutable destination object.
///
/// Batches are numbered from 0 in write order; a retried batch index
/// overwrites its object, so re-running a partially failed table
/// converges to the same destination state as a clean run.
pub struct BatchExtractor {
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
    batch_size: usize,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl BatchExtractor {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        retry: RetryPolicy,
        batch_size: usize,
        metrics: Metrics,
        cancel: CancellationToken,
    ) -> Self {
        BatchExtractor {
            store,
            retry,
            batch_size,
            metrics,
            cancel,
        }
    }

    pub async fn extract(
        &self,
        conn: &mut dyn SourceConnection,
        table: &TableSource,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let query = table.select_query();
        info!(table = %table.table, batch_size = self.batch_size, "Starting extraction");

        let mut cursor =
            conn.execute(&query)
                .await
                .map_err(|source| ExtractError::SourceUnavailable {
                    table: table.table.clone(),
                    source,
                })?;

        // Result descriptor, captured once before the first fetch.
        let columns = cursor.columns().to_vec();

        let mut outcome = ExtractionOutcome::default();
        loop {
            if self.cancel.is_cancelled() {
                return Err(ExtractError::Cancelled {
                    table: table.table.clone(),
                });
            }

            let rows =
                cursor
                    .fetch(self.batch_size)
                    .await
                    .map_err(|source| ExtractError::SourceUnavailable {
                        table: table.table.clone(),
                        source,
                    })?;
            // An empty fetch is the end of the result set and the only
            // way out of this loop.
            if rows.is_empty() {
                break;
            }

            let batch = Batch::new(&table.table, outcome.batches_written, columns.clone(), rows);
            self.write_batch(&batch).await?;

            outcome.rows_written += batch.row_count() as u64;
            outcome.batches_written += 1;
        }

        info!(
            table = %table.table,
            batches = outcome.batches_written,
            rows = outcome.rows_written,
            "Extraction complete"
        );
        Ok(outcome)
    }

    /// Serializes and uploads one batch. The object becomes visible
    /// only once fully written (store implementations publish
    /// atomically), and transient write faults are retried against the
    /// same key.
    async fn write_batch(&self, batch: &Batch) -> Result<(), ExtractError> {
        let key = batch.object_key();
        let bytes = codec::encode_batch(batch).map_err(|source| ExtractError::Encode {
            table: batch.table.clone(),
            index: batch.index,
            source,
        })?;

        debug!(key = %key, rows = batch.row_count(), "Writing batch object");

        let tries = AtomicUsize::new(0);
        let result = self
            .retry
            .run(
                || {
                    tries.fetch_add(1, Ordering::SeqCst);
                    let store = self.store.clone();
                    let key = key.clone();
                    let bytes = bytes.clone();
                    async move { store.put(&key, bytes).await }
                },
                classify_store_error,
            )
            .await;

        let attempts = tries.load(Ordering::SeqCst);
        if attempts > 1 {
            self.metrics.increment_write_retries(attempts as u64 - 1);
        }

        match result {
            Ok(()) => {
                self.metrics.increment_batches(1);
                self.metrics.increment_rows(batch.row_count() as u64);
                self.metrics.increment_bytes(bytes.len() as u64);
                Ok(())
            }
            Err(err) => Err(ExtractError::DestinationWrite {
                table: batch.table.clone(),
                index: batch.index,
                attempts,
                source: err.into_inner(),
            }),
        }
    }
}
