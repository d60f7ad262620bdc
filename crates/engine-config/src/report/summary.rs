use crate::report::validation::ValidationResult;
use chrono::{DateTime, Utc};
use model::jobs::JobStatus;
use serde::Serialize;

/// Everything the run learned about one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_extracted: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batches_written: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_status: Option<JobStatus>,

    pub validation: ValidationResult,
}

impl TableReport {
    pub fn new(validation: ValidationResult) -> Self {
        TableReport {
            table: validation.table.clone(),
            rows_extracted: None,
            batches_written: None,
            job_status: None,
            validation,
        }
    }

    pub fn with_extraction(mut self, rows: u64, batches: u32) -> Self {
        self.rows_extracted = Some(rows);
        self.batches_written = Some(batches);
        self
    }

    pub fn with_job_status(mut self, status: JobStatus) -> Self {
        self.job_status = Some(status);
        self
    }
}

/// Aggregate outcome of a run. Built once at the end; immutable.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tables: Vec<TableReport>,
    pub all_passed: bool,
}

impl RunReport {
    pub fn new(run_id: String, started_at: DateTime<Utc>, tables: Vec<TableReport>) -> Self {
        let all_passed = tables.iter().all(|t| t.validation.validation_passed);
        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tables,
            all_passed,
        }
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| !t.validation.validation_passed)
            .map(|t| t.table.as_str())
            .collect()
    }
}
