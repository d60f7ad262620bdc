use crate::core::identifiers::JobId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Remote transfer job state machine:
/// `Pending → Running → {Succeeded | Failed | TimedOut}`.
///
/// Pending and Running are the only non-terminal states. Once terminal,
/// a job never transitions again; `TimedOut` is assigned locally by the
/// monitor when `max_wait` elapses and is distinct from a remote
/// `Failed` (the remote job may still be executing).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed { message: String },
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            JobStatus::Failed { message } => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed { message } => write!(f, "failed: {message}"),
            JobStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// One submitted unit of remote work. Created at submission, mutated
/// only by the job monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferJob {
    pub table: String,
    pub id: JobId,
    pub status: JobStatus,
    /// Submission instant as an offset on the engine clock; the monitor
    /// measures `max_wait` from here.
    pub submitted_at: Duration,
}

impl TransferJob {
    pub fn submitted(table: &str, id: JobId, submitted_at: Duration) -> Self {
        TransferJob {
            table: table.to_string(),
            id,
            status: JobStatus::Pending,
            submitted_at,
        }
    }
}
