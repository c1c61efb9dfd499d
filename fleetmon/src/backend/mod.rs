//! Southbound backend client: the HTTP/JSON source of truth.
//!
//! The backend exposes four operations: the board inventory feed, the
//! pipeline feed, and the deploy/undeploy commands. [`BackendClient`]
//! abstracts over them so the collector and the control service can be
//! driven by an in-process fake in tests; [`HttpBackendClient`] is the
//! production implementation over `reqwest`.

mod client;
mod types;

use std::future::Future;

pub use client::HttpBackendClient;
pub use types::{
    BoardReport, BoardTaskReport, DeployOutcome, LabelReport, PipelineOpResult, PipelineReport,
    ServiceReport, ServiceTaskReport,
};

/// Errors surfaced by backend operations.
///
/// Timeouts and connection failures both land in [`BackendError::Http`];
/// callers treat every variant the same way (the operation failed, keep
/// the last-known-good state).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure: connect error, timeout, request error.
    #[error("backend request failed: {0}")]
    Http(String),

    /// The backend answered with a non-2xx status.
    #[error("backend returned HTTP {0}")]
    Status(u16),

    /// The response body did not parse as the expected JSON shape.
    #[error("backend response malformed: {0}")]
    Json(String),
}

/// Typed operations against the backend.
pub trait BackendClient: Send + Sync {
    /// Fetch the board inventory feed (`GET /boardinfo`).
    fn get_board_info(
        &self,
    ) -> impl Future<Output = Result<Vec<BoardReport>, BackendError>> + Send;

    /// Fetch the pipeline feed (`GET /stackinfo`).
    fn get_pipeline_info(
        &self,
    ) -> impl Future<Output = Result<Vec<PipelineReport>, BackendError>> + Send;

    /// Deploy all pipelines carrying the given label UUIDs.
    fn deploy(
        &self,
        labels: &[String],
    ) -> impl Future<Output = Result<DeployOutcome, BackendError>> + Send;

    /// Undeploy all pipelines carrying the given label UUIDs.
    fn undeploy(
        &self,
        labels: &[String],
    ) -> impl Future<Output = Result<DeployOutcome, BackendError>> + Send;
}
