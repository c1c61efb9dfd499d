//! HTTP implementation of the backend client over `reqwest`.

use std::time::Duration;

use super::types::{DataEnvelope, DeployRequest};
use super::{BackendClient, BackendError, BoardReport, DeployOutcome, PipelineReport};

/// Path of the board inventory feed.
const BOARD_INFO_PATH: &str = "/api/v1/external/qyw/boardinfo";

/// Path of the pipeline feed.
const PIPELINE_INFO_PATH: &str = "/api/v1/external/qyw/stackinfo";

/// Path of the deploy command.
const DEPLOY_PATH: &str = "/api/v1/external/qyw/deploy";

/// Path of the undeploy command.
const UNDEPLOY_PATH: &str = "/api/v1/external/qyw/undeploy";

/// Backend client over a pooled `reqwest::Client`.
///
/// The timeout applies per request; a timed-out call surfaces as
/// [`BackendError::Http`] like any other transport failure.
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    /// Create a client for the given base URL (e.g. `http://10.0.0.5:8080`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Json(e.to_string()))
    }

    async fn post_labels(
        &self,
        path: &str,
        labels: &[String],
    ) -> Result<DeployOutcome, BackendError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&DeployRequest {
                stack_labels: labels,
            })
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| BackendError::Json(e.to_string()))
    }
}

impl BackendClient for HttpBackendClient {
    async fn get_board_info(&self) -> Result<Vec<BoardReport>, BackendError> {
        let envelope: DataEnvelope<BoardReport> = self.get_json(BOARD_INFO_PATH).await?;
        tracing::debug!(boards = envelope.data.len(), "Board feed fetched");
        Ok(envelope.data)
    }

    async fn get_pipeline_info(&self) -> Result<Vec<PipelineReport>, BackendError> {
        let envelope: DataEnvelope<PipelineReport> = self.get_json(PIPELINE_INFO_PATH).await?;
        tracing::debug!(pipelines = envelope.data.len(), "Pipeline feed fetched");
        Ok(envelope.data)
    }

    async fn deploy(&self, labels: &[String]) -> Result<DeployOutcome, BackendError> {
        let outcome = self.post_labels(DEPLOY_PATH, labels).await?;
        tracing::info!(
            labels = labels.len(),
            succeeded = outcome.success.len(),
            failed = outcome.failure.len(),
            "Deploy executed"
        );
        Ok(outcome)
    }

    async fn undeploy(&self, labels: &[String]) -> Result<DeployOutcome, BackendError> {
        let outcome = self.post_labels(UNDEPLOY_PATH, labels).await?;
        tracing::info!(
            labels = labels.len(),
            succeeded = outcome.success.len(),
            failed = outcome.failure.len(),
            "Undeploy executed"
        );
        Ok(outcome)
    }
}
