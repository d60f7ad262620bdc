use crate::error::ValidateError;
use connectors::{codec, source::SourceConnection, store::ObjectStore};
use engine_config::report::validation::ValidationResult;
use model::{records::batch, records::row::RowData, source::TableSource};
use std::sync::Arc;
use tracing::{info, warn};

struct DestinationScan {
    row_count: u64,
    sample: Vec<Vec<String>>,
}

/// Independently re-derives counts and a bounded sample from both sides
/// of a migrated table and computes the verdict.
pub struct MigrationValidator {
    store: Arc<dyn ObjectStore>,
    sample_size: usize,
    float_tolerance: Option<f64>,
}

impl MigrationValidator {
    pub fn new(store: Arc<dyn ObjectStore>, sample_size: usize, float_tolerance: Option<f64>) -> Self {
        MigrationValidator {
            store,
            sample_size,
            float_tolerance,
        }
    }

    /// Never fails the caller: any error during validation becomes a
    /// failed verdict for this table, so the remaining tables keep
    /// validating.
    pub async fn validate(
        &self,
        conn: &mut dyn SourceConnection,
        table: &TableSource,
    ) -> ValidationResult {
        match self.validate_inner(conn, table).await {
            Ok(result) => result,
            Err(err) => {
                warn!(table = %table.table, error = %err, "Validation failed to run");
                ValidationResult::failed(&table.table, err.to_string())
            }
        }
    }

    async fn validate_inner(
        &self,
        conn: &mut dyn SourceConnection,
        table: &TableSource,
    ) -> Result<ValidationResult, ValidateError> {
        let source_count = self.source_count(conn, table).await?;
        let destination = self.scan_destination(&table.table).await?;
        let source_sample = self.source_sample(conn, table).await?;

        let sample_match = samples_match(
            &source_sample,
            &destination.sample,
            self.float_tolerance,
        );

        info!(
            table = %table.table,
            source_count,
            destination_count = destination.row_count,
            compared_rows = source_sample.len().min(destination.sample.len()),
            "Validation computed"
        );

        Ok(ValidationResult::checked(
            &table.table,
            source_count,
            destination.row_count,
            sample_match,
        ))
    }

    async fn source_count(
        &self,
        conn: &mut dyn SourceConnection,
        table: &TableSource,
    ) -> Result<u64, ValidateError> {
        let mut cursor = conn.execute(&table.count_query()).await?;
        let rows = cursor.fetch(1).await?;
        let row = rows.first().ok_or(ValidateError::EmptyCount)?;
        let field = row.fields.first().ok_or(ValidateError::EmptyCount)?;
        field
            .value
            .as_u64()
            .ok_or_else(|| ValidateError::BadCount(field.value.to_field()))
    }

    /// Bounded sample in the table's deterministic order, projected to
    /// the same canonical strings the batch objects carry.
    async fn source_sample(
        &self,
        conn: &mut dyn SourceConnection,
        table: &TableSource,
    ) -> Result<Vec<Vec<String>>, ValidateError> {
        if self.sample_size == 0 {
            return Ok(Vec::new());
        }

        let mut cursor = conn.execute(&table.sample_query(self.sample_size)).await?;
        let columns = cursor.columns().to_vec();

        let mut sample = Vec::with_capacity(self.sample_size);
        while sample.len() < self.sample_size {
            let rows = cursor.fetch(self.sample_size - sample.len()).await?;
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                sample.push(project(row, &columns));
            }
        }
        Ok(sample)
    }

    /// Counts rows across every batch object under the table's prefix
    /// (not just the first) and collects the head of the concatenation,
    /// in ascending batch order, as the destination sample.
    async fn scan_destination(&self, table: &str) -> Result<DestinationScan, ValidateError> {
        let prefix = batch::key_prefix(table);
        let mut objects: Vec<(u32, String)> = self
            .store
            .list(&prefix)
            .await?
            .into_iter()
            .filter_map(|meta| batch::parse_index(&meta.key).map(|idx| (idx, meta.key)))
            .collect();
        objects.sort_by_key(|(idx, _)| *idx);

        let mut row_count = 0u64;
        let mut sample = Vec::new();
        for (_, key) in &objects {
            let bytes = self.store.get(key).await?;
            let decoded = codec::decode_object(&bytes)?;
            row_count += decoded.rows.len() as u64;
            for row in decoded.rows {
                if sample.len() < self.sample_size {
                    sample.push(row);
                }
            }
        }

        Ok(DestinationScan { row_count, sample })
    }
}

fn project(row: &RowData, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| row.get_value(column).to_field())
        .collect()
}

/// Row-by-row, column-by-column string-normalized comparison, truncated
/// to the shorter of the two samples. Any mismatch short-circuits.
pub fn samples_match(
    source: &[Vec<String>],
    destination: &[Vec<String>],
    float_tolerance: Option<f64>,
) -> bool {
    source
        .iter()
        .zip(destination.iter())
        .all(|(s, d)| rows_match(s, d, float_tolerance))
}

fn rows_match(source: &[String], destination: &[String], tolerance: Option<f64>) -> bool {
    source.len() == destination.len()
        && source
            .iter()
            .zip(destination.iter())
            .all(|(a, b)| fields_match(a, b, tolerance))
}

fn fields_match(a: &str, b: &str, tolerance: Option<f64>) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    if let Some(tolerance) = tolerance
        && let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>())
    {
        return (x - y).abs() <= tolerance;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::BatchExtractor;
    use async_trait::async_trait;
    use bytes::Bytes;
    use connectors::{
        error::SourceError, memory::MemorySource, source::RowCursor,
        store::memory::MemoryObjectStore,
    };
    use engine_core::{metrics::Metrics, retry::RetryPolicy};
    use tokio_util::sync::CancellationToken;

    fn orders_source() -> MemorySource {
        MemorySource::from_json_rows(
            "orders",
            vec!["id".into(), "item".into()],
            &[
                vec![serde_json::json!(1), serde_json::json!("A")],
                vec![serde_json::json!(2), serde_json::json!("B")],
                vec![serde_json::json!(3), serde_json::json!("C")],
            ],
        )
    }

    async fn extract_to(store: &MemoryObjectStore, source: &mut MemorySource, batch_size: usize) {
        BatchExtractor::new(
            Arc::new(store.clone()),
            RetryPolicy::immediate(1),
            batch_size,
            Metrics::new(),
            CancellationToken::new(),
        )
        .extract(source, &TableSource::new("orders"))
        .await
        .unwrap();
    }

    fn validator(store: &MemoryObjectStore, sample_size: usize) -> MigrationValidator {
        MigrationValidator::new(Arc::new(store.clone()), sample_size, None)
    }

    struct DeadSource;

    #[async_trait]
    impl SourceConnection for DeadSource {
        async fn execute<'a>(
            &'a mut self,
            _query: &str,
        ) -> Result<Box<dyn RowCursor + Send + 'a>, SourceError> {
            Err(SourceError::InvalidUrl("no route to host".into()))
        }
    }

    #[tokio::test]
    async fn mirrored_destination_passes() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();
        extract_to(&store, &mut source, 2).await;

        let result = validator(&store, 100)
            .validate(&mut source, &TableSource::new("orders"))
            .await;

        assert_eq!(result.source_count, 3);
        assert_eq!(result.destination_count, 3);
        assert!(result.count_match);
        assert!(result.sample_match);
        assert!(result.validation_passed);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn destination_count_spans_all_batch_objects() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();
        // Batch size 1 produces three objects; a first-object-only scan
        // would report 1.
        extract_to(&store, &mut source, 1).await;

        let result = validator(&store, 100)
            .validate(&mut source, &TableSource::new("orders"))
            .await;
        assert_eq!(result.destination_count, 3);
        assert!(result.validation_passed);
    }

    #[tokio::test]
    async fn count_drift_fails_validation() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();
        extract_to(&store, &mut source, 2).await;

        // Lose the tail batch: 3 source rows vs 2 destination rows.
        store.remove("orders/batch_00001.csv").await.unwrap();

        let result = validator(&store, 100)
            .validate(&mut source, &TableSource::new("orders"))
            .await;
        assert_eq!(result.source_count, 3);
        assert_eq!(result.destination_count, 2);
        assert!(!result.count_match);
        assert!(!result.validation_passed);
    }

    #[tokio::test]
    async fn corrupted_cell_fails_the_sample_check() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();
        extract_to(&store, &mut source, 2).await;

        use connectors::store::ObjectStore;
        store
            .put(
                "orders/batch_00000.csv",
                Bytes::from_static(b"id,item\n1,A\n2,WRONG\n"),
            )
            .await
            .unwrap();

        let result = validator(&store, 100)
            .validate(&mut source, &TableSource::new("orders"))
            .await;
        assert!(result.count_match);
        assert!(!result.sample_match);
        assert!(!result.validation_passed);
    }

    #[tokio::test]
    async fn comparison_truncates_to_the_sample_bound() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();
        extract_to(&store, &mut source, 2).await;

        // Only the first row participates; corrupting the second goes
        // unnoticed by the sample check but still fails on counts if
        // rows disappear. Here rows are intact, so the verdict holds.
        let result = validator(&store, 1)
            .validate(&mut source, &TableSource::new("orders"))
            .await;
        assert!(result.sample_match);
        assert!(result.validation_passed);
    }

    #[tokio::test]
    async fn unreachable_source_is_captured_not_propagated() {
        let store = MemoryObjectStore::new();
        let mut dead = DeadSource;

        let result = validator(&store, 100)
            .validate(&mut dead, &TableSource::new("orders"))
            .await;
        assert!(!result.validation_passed);
        assert!(result.error.as_deref().unwrap().contains("no route to host"));
    }

    #[tokio::test]
    async fn malformed_destination_object_is_captured() {
        let store = MemoryObjectStore::new();
        let mut source = orders_source();

        use connectors::store::ObjectStore;
        store
            .put(
                "orders/batch_00000.csv",
                Bytes::from_static(b"id,item\n1\n"),
            )
            .await
            .unwrap();

        let result = validator(&store, 100)
            .validate(&mut source, &TableSource::new("orders"))
            .await;
        assert!(!result.validation_passed);
        assert!(result.error.is_some());
    }

    #[test]
    fn tolerance_only_applies_to_numeric_fields() {
        assert!(fields_match("1.0001", "1.0002", Some(0.01)));
        assert!(!fields_match("1.0001", "1.2", Some(0.01)));
        assert!(!fields_match("abc", "abd", Some(0.01)));
        assert!(fields_match("  A ", "A", None));
    }
}
