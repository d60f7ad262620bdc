use crate::{error::MigrationError, execution::factory};
use chrono::Utc;
use connectors::{store::ObjectStore, transfer::TransferService};
use engine_config::{
    plan::MigrationPlan,
    report::{
        summary::{RunReport, TableReport},
        validation::ValidationResult,
    },
    settings::{TransferMode, ValidatedSettings},
};
use engine_core::{
    clock::{Clock, TokioClock},
    metrics::Metrics,
    retry::RetryPolicy,
};
use engine_processing::{
    extract::BatchExtractor,
    monitor::{JobMonitor, submit_job},
    validate::MigrationValidator,
};
use futures::stream::{self, StreamExt};
use model::{
    core::identifiers::RunId,
    jobs::{JobStatus, TransferJob},
    source::TableSource,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Redirects destination writes to an in-memory store.
    pub dry_run: bool,
    /// Skips extraction and submission; verdicts are computed against
    /// the existing destination state.
    pub validate_only: bool,
    /// Restricts the run to these plan tables.
    pub tables: Option<Vec<String>>,
}

pub async fn run(
    plan: MigrationPlan,
    options: RunOptions,
    cancel: CancellationToken,
) -> Result<RunReport, MigrationError> {
    MigrationExecutor::new(plan, options, cancel)?.execute().await
}

pub struct MigrationExecutor {
    plan: MigrationPlan,
    settings: ValidatedSettings,
    options: RunOptions,
    cancel: CancellationToken,
    store: Arc<dyn ObjectStore>,
    transfer: Option<Arc<dyn TransferService>>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
    run_id: RunId,
}

impl MigrationExecutor {
    pub fn new(
        plan: MigrationPlan,
        options: RunOptions,
        cancel: CancellationToken,
    ) -> Result<Self, MigrationError> {
        let settings = plan.validate()?;
        let store = factory::create_store(&plan.destination, options.dry_run);
        let transfer = plan.transfer.as_ref().map(factory::create_transfer);

        Ok(MigrationExecutor {
            plan,
            settings,
            options,
            cancel,
            store,
            transfer,
            clock: Arc::new(TokioClock::new()),
            metrics: Metrics::new(),
            run_id: RunId::generate(),
        })
    }

    pub async fn execute(self) -> Result<RunReport, MigrationError> {
        let started_at = Utc::now();
        let tables = self.selected_tables()?;

        info!(
            run_id = %self.run_id,
            tables = tables.len(),
            transfer = ?self.settings.transfer,
            validate_only = self.options.validate_only,
            dry_run = self.options.dry_run,
            "Starting migration run"
        );

        let reports = if self.options.validate_only {
            self.run_validate_only(&tables).await
        } else {
            match self.settings.transfer {
                TransferMode::Direct => self.run_direct(&tables).await,
                TransferMode::Managed => self.run_managed(&tables).await?,
            }
        };

        if self.cancel.is_cancelled() {
            warn!("Shutdown requested; abandoning the run before the report is final");
            return Err(MigrationError::ShutdownRequested);
        }

        let snapshot = self.metrics.snapshot();
        info!(
            rows = snapshot.rows_extracted,
            batches = snapshot.batches_written,
            bytes = snapshot.bytes_written,
            write_retries = snapshot.write_retries,
            table_failures = snapshot.table_failures,
            "Run metrics"
        );

        let report = RunReport::new(self.run_id.to_string(), started_at, reports);
        if report.all_passed {
            info!(run_id = %self.run_id, "Migration run passed");
        } else {
            error!(
                run_id = %self.run_id,
                failed = ?report.failed_tables(),
                "Migration run finished with failures"
            );
        }
        Ok(report)
    }

    fn selected_tables(&self) -> Result<Vec<TableSource>, MigrationError> {
        let tables: Vec<TableSource> = match &self.options.tables {
            None => self.plan.tables.clone(),
            Some(filter) => {
                for name in filter {
                    if !self.plan.tables.iter().any(|t| &t.table == name) {
                        warn!(table = %name, "Table filter does not match any plan entry");
                    }
                }
                self.plan
                    .tables
                    .iter()
                    .filter(|t| filter.iter().any(|name| name == &t.table))
                    .cloned()
                    .collect()
            }
        };

        if tables.is_empty() {
            return Err(MigrationError::Initialization(
                "no tables selected for this run".into(),
            ));
        }
        Ok(tables)
    }

    /// Direct path: per-table extract-then-validate pipelines, at most
    /// `parallel_tables` in flight. Order of the report follows the
    /// plan, not completion.
    async fn run_direct(&self, tables: &[TableSource]) -> Vec<TableReport> {
        let mut indexed: Vec<(usize, TableReport)> = stream::iter(tables.iter().enumerate())
            .map(|(idx, table)| async move { (idx, self.run_table_direct(table).await) })
            .buffer_unordered(self.settings.parallel_tables)
            .collect()
            .await;
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, report)| report).collect()
    }

    async fn run_table_direct(&self, table: &TableSource) -> TableReport {
        info!(table = %table.table, "Processing table");

        let mut conn = match factory::connect_source(&self.plan.source).await {
            Ok(conn) => conn,
            Err(err) => return self.table_failed(table, err.to_string()),
        };

        let extractor = BatchExtractor::new(
            self.store.clone(),
            RetryPolicy::for_object_store(self.settings.max_write_attempts),
            self.settings.batch_size,
            self.metrics.clone(),
            self.cancel.clone(),
        );

        let outcome = match extractor.extract(conn.as_mut(), table).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(table = %table.table, error = %err, "Extraction failed");
                return self.table_failed(table, err.to_string());
            }
        };

        let validation = self.validator().validate(conn.as_mut(), table).await;
        if !validation.validation_passed {
            self.metrics.increment_table_failures(1);
        }
        TableReport::new(validation)
            .with_extraction(outcome.rows_written, outcome.batches_written)
    }

    async fn run_validate_only(&self, tables: &[TableSource]) -> Vec<TableReport> {
        let mut indexed: Vec<(usize, TableReport)> = stream::iter(tables.iter().enumerate())
            .map(|(idx, table)| async move { (idx, self.run_table_validate(table).await) })
            .buffer_unordered(self.settings.parallel_tables)
            .collect()
            .await;
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, report)| report).collect()
    }

    async fn run_table_validate(&self, table: &TableSource) -> TableReport {
        match factory::connect_source(&self.plan.source).await {
            Ok(mut conn) => {
                let validation = self.validator().validate(conn.as_mut(), table).await;
                if !validation.validation_passed {
                    self.metrics.increment_table_failures(1);
                }
                TableReport::new(validation)
            }
            Err(err) => self.table_failed(table, err.to_string()),
        }
    }

    /// Managed path: submit one job per table, drive them all with a
    /// single monitor, then validate the tables whose job succeeded.
    async fn run_managed(
        &self,
        tables: &[TableSource],
    ) -> Result<Vec<TableReport>, MigrationError> {
        let service = self.transfer.clone().ok_or_else(|| {
            MigrationError::Initialization("transfer service not configured".into())
        })?;

        let mut reports: Vec<Option<TableReport>> = vec![None; tables.len()];
        let mut submitted: Vec<(usize, TransferJob)> = Vec::new();

        for (idx, table) in tables.iter().enumerate() {
            match submit_job(service.as_ref(), self.clock.as_ref(), table).await {
                Ok(job) => submitted.push((idx, job)),
                Err(err) => {
                    error!(table = %table.table, error = %err, "Job submission failed");
                    reports[idx] = Some(self.table_failed(table, err.to_string()));
                }
            }
        }

        let monitor = JobMonitor::new(
            service.clone(),
            self.clock.clone(),
            self.settings.poll_interval,
            self.settings.max_wait,
            self.cancel.clone(),
        );
        let jobs: Vec<TransferJob> = submitted.iter().map(|(_, job)| job.clone()).collect();
        let statuses = monitor.monitor(jobs).await;

        for (idx, job) in submitted {
            let table = &tables[idx];
            let status = statuses
                .get(&job.table)
                .cloned()
                .unwrap_or(JobStatus::TimedOut);
            self.metrics.increment_jobs_completed(1);

            let report = if status.is_success() {
                let validation = match factory::connect_source(&self.plan.source).await {
                    Ok(mut conn) => self.validator().validate(conn.as_mut(), table).await,
                    Err(err) => ValidationResult::failed(&table.table, err.to_string()),
                };
                if !validation.validation_passed {
                    self.metrics.increment_table_failures(1);
                }
                TableReport::new(validation).with_job_status(status)
            } else {
                self.metrics.increment_table_failures(1);
                TableReport::new(ValidationResult::failed(
                    &table.table,
                    format!("transfer job did not succeed: {status}"),
                ))
                .with_job_status(status)
            };

            reports[idx] = Some(report);
        }

        Ok(reports.into_iter().flatten().collect())
    }

    fn validator(&self) -> MigrationValidator {
        MigrationValidator::new(
            self.store.clone(),
            self.settings.sample_size,
            self.settings.float_tolerance,
        )
    }

    fn table_failed(&self, table: &TableSource, error: String) -> TableReport {
        self.metrics.increment_table_failures(1);
        TableReport::new(ValidationResult::failed(&table.table, error))
    }
}
