use crate::{
    error::TransferError,
    transfer::{SubmitRequest, TransferService},
};
use async_trait::async_trait;
use model::{core::identifiers::JobId, jobs::JobStatus};
use serde::Deserialize;

/// JSON/HTTP client for the managed transfer endpoint:
/// `POST /jobs` submits, `GET /jobs/{id}` reports status.
pub struct HttpTransferService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransferService {
    pub fn new(endpoint: &str) -> Self {
        HttpTransferService {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    state: String,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl TransferService for HttpTransferService {
    async fn submit(&self, request: &SubmitRequest) -> Result<JobId, TransferError> {
        let response: SubmitResponse = self
            .client
            .post(format!("{}/jobs", self.endpoint))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(JobId::new(response.job_id))
    }

    async fn status(&self, id: &JobId) -> Result<JobStatus, TransferError> {
        let response: StatusResponse = self
            .client
            .get(format!("{}/jobs/{}", self.endpoint, id))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.state.as_str() {
            "pending" | "queued" => Ok(JobStatus::Pending),
            "running" | "in_progress" => Ok(JobStatus::Running),
            "succeeded" => Ok(JobStatus::Succeeded),
            "failed" => Ok(JobStatus::Failed {
                message: response
                    .error
                    .unwrap_or_else(|| "remote job failed".to_string()),
            }),
            other => Err(TransferError::Protocol(format!(
                "unknown job state '{other}'"
            ))),
        }
    }
}
