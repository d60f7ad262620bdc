use crate::error::TransferError;
use async_trait::async_trait;
use model::{core::identifiers::JobId, jobs::JobStatus};
use serde::{Deserialize, Serialize};

pub mod http;

/// Parameters for one remote transfer job: which table to move and
/// where its batch objects should land.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub table: String,
    pub source_query: String,
    pub destination_prefix: String,
}

/// Managed transfer service: submits per-table jobs and reports their
/// remote status. The service executes asynchronously; callers observe
/// completion by polling `status`.
#[async_trait]
pub trait TransferService: Send + Sync {
    async fn submit(&self, request: &SubmitRequest) -> Result<JobId, TransferError>;

    async fn status(&self, id: &JobId) -> Result<JobStatus, TransferError>;
}
