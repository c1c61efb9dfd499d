//! Control service: pipeline deploy/undeploy through the backend.
//!
//! The backend is the source of truth for deployment state. This service
//! only validates the request, relays it, and wraps the per-pipeline
//! success/failure partitions into a response; it never touches the
//! pipeline store itself (the next collector tick picks up the new state).

use std::sync::Arc;

use tracing::warn;

use crate::backend::BackendClient;
use crate::dto::{DeployResult, ServiceResponse};
use crate::store::PipelineStore;

/// Deploy/undeploy front-end over the backend client.
pub struct ControlService<C> {
    backend: Arc<C>,
    pipelines: Arc<PipelineStore>,
}

impl<C: BackendClient> ControlService<C> {
    pub fn new(backend: Arc<C>, pipelines: Arc<PipelineStore>) -> Self {
        Self { backend, pipelines }
    }

    /// Deploy every pipeline carrying any of the given label UUIDs.
    pub async fn deploy_by_labels(&self, labels: &[String]) -> ServiceResponse<DeployResult> {
        if labels.is_empty() {
            return ServiceResponse::invalid_argument("label list must not be empty");
        }

        match self.backend.deploy(labels).await {
            Ok(outcome) => ServiceResponse::ok_with(
                DeployResult::new(outcome.success, outcome.failure),
                "deploy executed",
            ),
            Err(e) => {
                warn!(error = %e, "Deploy relay failed");
                ServiceResponse::backend_unavailable(e.to_string())
            }
        }
    }

    /// Undeploy every pipeline carrying any of the given label UUIDs.
    pub async fn undeploy_by_labels(&self, labels: &[String]) -> ServiceResponse<DeployResult> {
        if labels.is_empty() {
            return ServiceResponse::invalid_argument("label list must not be empty");
        }

        match self.backend.undeploy(labels).await {
            Ok(outcome) => ServiceResponse::ok_with(
                DeployResult::new(outcome.success, outcome.failure),
                "undeploy executed",
            ),
            Err(e) => {
                warn!(error = %e, "Undeploy relay failed");
                ServiceResponse::backend_unavailable(e.to_string())
            }
        }
    }

    /// Single-label convenience used by the command listener.
    pub async fn deploy_by_label(&self, label: &str) -> ServiceResponse<DeployResult> {
        self.deploy_by_labels(&[label.to_string()]).await
    }

    /// Single-label convenience used by the command listener.
    pub async fn undeploy_by_label(&self, label: &str) -> ServiceResponse<DeployResult> {
        self.undeploy_by_labels(&[label.to_string()]).await
    }

    /// UUIDs of the pipelines a label operation would touch, without
    /// performing it.
    pub fn preview_by_label(&self, label: &str) -> ServiceResponse<Vec<String>> {
        let uuids: Vec<String> = self
            .pipelines
            .find_by_label(label)
            .into_iter()
            .map(|p| p.uuid)
            .collect();
        let count = uuids.len();
        ServiceResponse::ok_with(uuids, format!("{count} pipelines carry this label"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendError, BoardReport, DeployOutcome, PipelineOpResult, PipelineReport,
    };
    use crate::domain::{Pipeline, PipelineLabel};
    use crate::dto::ResponseCode;

    /// Backend that records label lists and answers with a canned outcome.
    struct FakeBackend {
        fail: bool,
    }

    impl BackendClient for FakeBackend {
        async fn get_board_info(&self) -> Result<Vec<BoardReport>, BackendError> {
            Ok(vec![])
        }

        async fn get_pipeline_info(&self) -> Result<Vec<PipelineReport>, BackendError> {
            Ok(vec![])
        }

        async fn deploy(&self, labels: &[String]) -> Result<DeployOutcome, BackendError> {
            if self.fail {
                return Err(BackendError::Status(503));
            }
            Ok(DeployOutcome {
                success: labels
                    .iter()
                    .map(|l| PipelineOpResult {
                        stack_uuid: format!("stack-for-{l}"),
                        message: "deployed".to_string(),
                        ..Default::default()
                    })
                    .collect(),
                failure: vec![],
            })
        }

        async fn undeploy(&self, labels: &[String]) -> Result<DeployOutcome, BackendError> {
            self.deploy(labels).await
        }
    }

    fn control(fail: bool) -> ControlService<FakeBackend> {
        ControlService::new(Arc::new(FakeBackend { fail }), Arc::new(PipelineStore::new()))
    }

    #[tokio::test]
    async fn test_empty_labels_rejected_without_backend_call() {
        let response = control(true).deploy_by_labels(&[]).await;
        assert!(!response.success);
        assert_eq!(response.code, ResponseCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_deploy_wraps_backend_partitions() {
        let response = control(false)
            .deploy_by_labels(&["label-1".to_string()])
            .await;
        assert!(response.success);
        let result = response.data.unwrap();
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 0);
        assert_eq!(result.succeeded[0].stack_uuid, "stack-for-label-1");
    }

    #[tokio::test]
    async fn test_backend_failure_is_relayed() {
        let response = control(true).undeploy_by_label("label-1").await;
        assert!(!response.success);
        assert_eq!(response.code, ResponseCode::BackendUnavailable);
        assert!(response.message.contains("503"));
    }

    #[tokio::test]
    async fn test_preview_by_label() {
        let service = control(false);
        let mut pipeline = Pipeline::new("stack-1", "detector");
        pipeline.add_label(PipelineLabel {
            name: "edge".to_string(),
            uuid: "label-1".to_string(),
        });
        service.pipelines.save(pipeline);

        let response = service.preview_by_label("label-1");
        assert!(response.success);
        assert_eq!(response.data.unwrap(), vec!["stack-1".to_string()]);

        let empty = service.preview_by_label("label-x");
        assert!(empty.data.unwrap().is_empty());
    }
}
