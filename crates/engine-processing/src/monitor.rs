use crate::error::SubmitError;
use connectors::transfer::{SubmitRequest, TransferService};
use engine_core::clock::Clock;
use model::{
    jobs::{JobStatus, TransferJob},
    records::batch,
    source::TableSource,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Submits one remote transfer job for `table`. Submission failures are
/// not retried; they fail the table immediately.
pub async fn submit_job(
    service: &dyn TransferService,
    clock: &dyn Clock,
    table: &TableSource,
) -> Result<TransferJob, SubmitError> {
    let request = SubmitRequest {
        table: table.table.clone(),
        source_query: table.select_query(),
        destination_prefix: batch::key_prefix(&table.table),
    };

    let id = service
        .submit(&request)
        .await
        .map_err(|source| SubmitError::Submission {
            table: table.table.clone(),
            source,
        })?;

    info!(table = %table.table, job = %id, "Transfer job submitted");
    Ok(TransferJob::submitted(&table.table, id, clock.now()))
}

/// Single-table convenience step: submit the table's job and drive it
/// to a terminal status.
pub async fn submit_and_monitor(
    service: Arc<dyn TransferService>,
    clock: Arc<dyn Clock>,
    table: &TableSource,
    poll_interval: Duration,
    max_wait: Duration,
    cancel: CancellationToken,
) -> Result<JobStatus, SubmitError> {
    let job = submit_job(service.as_ref(), clock.as_ref(), table).await?;
    let table_name = job.table.clone();

    let monitor = JobMonitor::new(service, clock, poll_interval, max_wait, cancel);
    let mut statuses = monitor.monitor(vec![job]).await;
    Ok(statuses.remove(&table_name).unwrap_or(JobStatus::TimedOut))
}

/// Drives a set of submitted jobs to terminal states.
///
/// The monitor is the single owner of the active set: a job observed
/// terminal is dropped from the next cycle and never re-polled, and the
/// loop always drains to one terminal status per submitted job. A
/// failed or stuck job never blocks observation of the others.
pub struct JobMonitor {
    service: Arc<dyn TransferService>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    max_wait: Duration,
    cancel: CancellationToken,
}

impl JobMonitor {
    pub fn new(
        service: Arc<dyn TransferService>,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        max_wait: Duration,
        cancel: CancellationToken,
    ) -> Self {
        JobMonitor {
            service,
            clock,
            poll_interval,
            max_wait,
            cancel,
        }
    }

    pub async fn monitor(&self, jobs: Vec<TransferJob>) -> HashMap<String, JobStatus> {
        let mut terminal = HashMap::with_capacity(jobs.len());
        let mut active = jobs;

        while !active.is_empty() {
            if self.cancel.is_cancelled() {
                warn!(
                    unresolved = active.len(),
                    "Cancellation requested, abandoning active transfer jobs"
                );
                for job in active.drain(..) {
                    terminal.insert(job.table, JobStatus::TimedOut);
                }
                break;
            }

            let now = self.clock.now();
            let mut still_active = Vec::with_capacity(active.len());

            for job in active {
                match self.service.status(&job.id).await {
                    Ok(status) if status.is_terminal() => {
                        info!(
                            table = %job.table,
                            job = %job.id,
                            status = %status,
                            "Transfer job reached a terminal state"
                        );
                        terminal.insert(job.table, status);
                    }
                    Ok(_) if self.timed_out(&job, now) => {
                        warn!(
                            table = %job.table,
                            job = %job.id,
                            "Transfer job exceeded max wait; unblocking as timed out"
                        );
                        terminal.insert(job.table, JobStatus::TimedOut);
                    }
                    Ok(_) => still_active.push(job),
                    Err(err) => {
                        warn!(table = %job.table, job = %job.id, error = %err, "Status poll failed");
                        if self.timed_out(&job, now) {
                            terminal.insert(job.table, JobStatus::TimedOut);
                        } else {
                            still_active.push(job);
                        }
                    }
                }
            }

            active = still_active;
            if active.is_empty() {
                break;
            }

            // The only suspension point in the monitor.
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = self.clock.sleep(self.poll_interval) => {}
            }
        }

        terminal
    }

    fn timed_out(&self, job: &TransferJob, now: Duration) -> bool {
        now.saturating_sub(job.submitted_at) >= self.max_wait
    }
}
