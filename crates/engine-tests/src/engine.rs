#[cfg(test)]
mod tests {
    use crate::utils::{ScriptedTransferService, orders_source};
    use connectors::{
        codec,
        store::{ObjectStore, memory::MemoryObjectStore},
    };
    use engine_core::{
        clock::ManualClock,
        metrics::Metrics,
        retry::RetryPolicy,
    };
    use engine_processing::{
        extract::BatchExtractor,
        monitor::{JobMonitor, submit_job},
        validate::MigrationValidator,
    };
    use model::{jobs::JobStatus, source::TableSource};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn extractor(store: Arc<dyn ObjectStore>, batch_size: usize) -> BatchExtractor {
        BatchExtractor::new(
            store,
            RetryPolicy::immediate(3),
            batch_size,
            Metrics::new(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn orders_scenario_extracts_two_batches_and_validates() {
        let store = MemoryObjectStore::new();
        let table = TableSource::new("orders");
        let mut source = orders_source();

        let outcome = extractor(Arc::new(store.clone()), 2)
            .extract(&mut source, &table)
            .await
            .unwrap();
        assert_eq!(outcome.batches_written, 2);
        assert_eq!(outcome.rows_written, 3);

        let first = codec::decode_object(&store.get("orders/batch_00000.csv").await.unwrap())
            .unwrap();
        assert_eq!(first.rows, vec![vec!["1", "A"], vec!["2", "B"]]);
        let second = codec::decode_object(&store.get("orders/batch_00001.csv").await.unwrap())
            .unwrap();
        assert_eq!(second.rows, vec![vec!["3", "C"]]);

        let result = MigrationValidator::new(Arc::new(store), 10, None)
            .validate(&mut source, &table)
            .await;
        assert_eq!(result.source_count, 3);
        assert_eq!(result.destination_count, 3);
        assert!(result.validation_passed);

        assert!(logs_contain("Extraction complete"));
    }

    #[tokio::test]
    async fn re_extraction_after_partial_loss_restores_a_clean_state() {
        let store = MemoryObjectStore::new();
        let table = TableSource::new("orders");

        let mut source = orders_source();
        extractor(Arc::new(store.clone()), 2)
            .extract(&mut source, &table)
            .await
            .unwrap();

        // Simulate a run that died after batch 0: only the tail object
        // is missing.
        store.remove("orders/batch_00001.csv").await.unwrap();
        let drifted = MigrationValidator::new(Arc::new(store.clone()), 10, None)
            .validate(&mut source, &table)
            .await;
        assert!(!drifted.validation_passed);

        // The retry reuses the same batch numbering, so the store
        // converges instead of accumulating duplicates.
        let mut source = orders_source();
        extractor(Arc::new(store.clone()), 2)
            .extract(&mut source, &table)
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        let healed = MigrationValidator::new(Arc::new(store), 10, None)
            .validate(&mut source, &table)
            .await;
        assert!(healed.validation_passed);
    }

    #[tokio::test]
    async fn managed_pipeline_submits_monitors_and_validates() {
        let store = MemoryObjectStore::new();
        let orders = TableSource::new("orders");
        let users = TableSource::new("users");

        // The remote service "copies" orders successfully (the data is
        // already in the destination) and fails the users pipeline.
        let mut source = orders_source();
        extractor(Arc::new(store.clone()), 2)
            .extract(&mut source, &orders)
            .await
            .unwrap();

        let service: Arc<ScriptedTransferService> = Arc::new(
            ScriptedTransferService::default()
                .script(
                    "orders",
                    vec![JobStatus::Pending, JobStatus::Running, JobStatus::Succeeded],
                )
                .script(
                    "users",
                    vec![
                        JobStatus::Running,
                        JobStatus::Failed {
                            message: "copy activity failed".into(),
                        },
                    ],
                ),
        );
        let clock = Arc::new(ManualClock::new());

        let jobs = vec![
            submit_job(service.as_ref(), clock.as_ref(), &orders)
                .await
                .unwrap(),
            submit_job(service.as_ref(), clock.as_ref(), &users)
                .await
                .unwrap(),
        ];

        let monitor = JobMonitor::new(
            service,
            clock,
            Duration::from_secs(10),
            Duration::from_secs(3600),
            CancellationToken::new(),
        );
        let statuses = monitor.monitor(jobs).await;

        assert_eq!(statuses["orders"], JobStatus::Succeeded);
        assert!(matches!(statuses["users"], JobStatus::Failed { .. }));

        // Only the succeeded table is worth validating; it passes.
        let result = MigrationValidator::new(Arc::new(store), 10, None)
            .validate(&mut source, &orders)
            .await;
        assert!(result.validation_passed);
    }

    #[tokio::test]
    async fn submission_failure_for_one_table_leaves_others_untouched() {
        let service = ScriptedTransferService::default().script(
            "orders",
            vec![JobStatus::Succeeded],
        );
        let clock = ManualClock::new();

        let ok = submit_job(&service, &clock, &TableSource::new("orders")).await;
        assert!(ok.is_ok());

        let missing = submit_job(&service, &clock, &TableSource::new("unmapped")).await;
        assert!(missing.is_err());
    }
}
