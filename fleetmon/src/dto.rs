//! Read-side views and the service response envelope.
//!
//! Every public service operation answers with a [`ServiceResponse`]:
//! success flag, numeric code, human-readable message, and an optional
//! body. The views are plain owned records assembled from store copies;
//! they serialize for the webhook surface and for logging.

use serde::Serialize;

use crate::backend::PipelineOpResult;
use crate::domain::{
    Alert, Board, Chassis, Pipeline, ResourceUsage, TaskDetail, TaskSummary,
};

/// Outcome category of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResponseCode {
    Ok = 0,
    NotFound = 1,
    InvalidArgument = 2,
    BackendUnavailable = 3,
    Transient = 4,
    Fatal = 5,
}

/// Uniform envelope for service operations.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub code: ResponseCode,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::ok_with(data, "ok")
    }

    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ResponseCode::Ok,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(ResponseCode::NotFound, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::failure(ResponseCode::InvalidArgument, message)
    }

    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::failure(ResponseCode::BackendUnavailable, message)
    }
}

/// Board view inside a chassis view.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub address: String,
    pub slot: u8,
    pub kind: i32,
    pub status: i32,
    pub tasks: Vec<TaskSummary>,
}

impl From<&Board> for BoardView {
    fn from(board: &Board) -> Self {
        Self {
            address: board.address().to_string(),
            slot: board.slot(),
            kind: board.kind() as i32,
            status: board.status().code(),
            tasks: board.tasks().to_vec(),
        }
    }
}

/// One chassis with per-chassis statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ChassisView {
    pub number: u8,
    pub name: String,
    pub boards: Vec<BoardView>,
    pub normal_boards: usize,
    pub abnormal_boards: usize,
    pub offline_boards: usize,
    pub total_tasks: usize,
}

impl From<&Chassis> for ChassisView {
    fn from(chassis: &Chassis) -> Self {
        Self {
            number: chassis.number(),
            name: chassis.name().to_string(),
            boards: chassis.boards().iter().map(BoardView::from).collect(),
            normal_boards: chassis.count_normal_boards(),
            abnormal_boards: chassis.count_abnormal_boards(),
            offline_boards: chassis.count_offline_boards(),
            total_tasks: chassis.count_tasks(),
        }
    }
}

/// Whole-fleet overview with headline counters.
#[derive(Debug, Clone, Serialize)]
pub struct SystemOverview {
    pub chassis: Vec<ChassisView>,
    pub total_chassis: usize,
    pub total_boards: usize,
    pub normal_boards: usize,
    pub abnormal_boards: usize,
    pub offline_boards: usize,
    pub total_tasks: usize,
}

/// Service view inside a pipeline view (task ids only, no numerics).
#[derive(Debug, Clone, Serialize)]
pub struct ServiceView {
    pub uuid: String,
    pub name: String,
    pub status: i32,
    pub kind: i32,
    pub task_ids: Vec<String>,
}

/// One pipeline with its labels and services.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineView {
    pub uuid: String,
    pub name: String,
    pub deploy_status: i32,
    pub running_status: i32,
    pub label_names: Vec<String>,
    pub label_uuids: Vec<String>,
    pub services: Vec<ServiceView>,
    pub service_count: usize,
    pub task_count: usize,
}

impl From<&Pipeline> for PipelineView {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            uuid: pipeline.uuid.clone(),
            name: pipeline.name.clone(),
            deploy_status: pipeline.deploy_status.code(),
            running_status: pipeline.running_status().code(),
            label_names: pipeline.labels().iter().map(|l| l.name.clone()).collect(),
            label_uuids: pipeline.labels().iter().map(|l| l.uuid.clone()).collect(),
            services: pipeline
                .services()
                .values()
                .map(|s| ServiceView {
                    uuid: s.uuid.clone(),
                    name: s.name.clone(),
                    status: s.status.code(),
                    kind: s.kind.code(),
                    task_ids: s.tasks().keys().cloned().collect(),
                })
                .collect(),
            service_count: pipeline.service_count(),
            task_count: pipeline.task_count(),
        }
    }
}

/// All pipelines with population statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineList {
    pub pipelines: Vec<PipelineView>,
    pub total: usize,
    pub deployed: usize,
    pub running_normally: usize,
    pub abnormal: usize,
}

/// On-demand drill-down for one task's resource numerics.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResourceView {
    pub task_id: String,
    pub task_status: String,
    pub cpu_cores: f32,
    pub cpu_used: f32,
    pub cpu_usage_pct: f32,
    pub memory_size: f32,
    pub memory_used: f32,
    pub memory_usage_pct: f32,
    pub net_rx: f32,
    pub net_tx: f32,
    pub gpu_mem_used: f32,
    pub chassis_name: String,
    pub chassis_number: i32,
    pub board_name: String,
    pub board_number: i32,
    pub board_address: String,
}

impl TaskResourceView {
    pub fn from_task(task: &TaskDetail) -> Self {
        let ResourceUsage {
            cpu_cores,
            cpu_used,
            cpu_usage_pct,
            memory_size,
            memory_used,
            memory_usage_pct,
            net_rx,
            net_tx,
            gpu_mem_used,
        } = task.resources;
        Self {
            task_id: task.task_id.clone(),
            task_status: task.task_status.clone(),
            cpu_cores,
            cpu_used,
            cpu_usage_pct,
            memory_size,
            memory_used,
            memory_usage_pct,
            net_rx,
            net_tx,
            gpu_mem_used,
            chassis_name: task.location.chassis_name.clone(),
            chassis_number: task.location.chassis_number,
            board_name: task.location.board_name.clone(),
            board_number: task.location.board_number,
            board_address: task.location.board_address.clone(),
        }
    }
}

/// One alert, flattened for consumers.
#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub uuid: String,
    pub kind: i32,
    pub timestamp: u64,
    pub acknowledged: bool,
    pub related_entity: String,
    pub messages: Vec<String>,
    pub chassis_name: String,
    pub chassis_number: i32,
    pub board_name: String,
    pub board_number: i32,
    pub board_address: String,
    pub pipeline_name: String,
    pub pipeline_uuid: String,
    pub service_name: String,
    pub service_uuid: String,
    pub task_id: String,
}

impl From<&Alert> for AlertView {
    fn from(alert: &Alert) -> Self {
        let component = alert.component_ref();
        Self {
            uuid: alert.uuid().to_string(),
            kind: alert.kind().code(),
            timestamp: alert.timestamp(),
            acknowledged: alert.is_acknowledged(),
            related_entity: alert.related_entity().to_string(),
            messages: alert.messages().iter().map(|m| m.text.clone()).collect(),
            chassis_name: alert.location().chassis_name.clone(),
            chassis_number: alert.location().chassis_number,
            board_name: alert.location().board_name.clone(),
            board_number: alert.location().board_number,
            board_address: alert.location().board_address.clone(),
            pipeline_name: component.map(|c| c.pipeline_name.clone()).unwrap_or_default(),
            pipeline_uuid: component.map(|c| c.pipeline_uuid.clone()).unwrap_or_default(),
            service_name: component.map(|c| c.service_name.clone()).unwrap_or_default(),
            service_uuid: component.map(|c| c.service_uuid.clone()).unwrap_or_default(),
            task_id: component.map(|c| c.task_id.clone()).unwrap_or_default(),
        }
    }
}

/// A batch of alerts with counters.
#[derive(Debug, Clone, Serialize)]
pub struct AlertList {
    pub alerts: Vec<AlertView>,
    pub total: usize,
    pub unacknowledged: usize,
    pub board_alerts: usize,
    pub component_alerts: usize,
}

/// Outcome of a deploy/undeploy command.
#[derive(Debug, Clone, Serialize)]
pub struct DeployResult {
    pub succeeded: Vec<PipelineOpResult>,
    pub failed: Vec<PipelineOpResult>,
    pub total_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

impl DeployResult {
    pub fn new(succeeded: Vec<PipelineOpResult>, failed: Vec<PipelineOpResult>) -> Self {
        let success_count = succeeded.len();
        let failure_count = failed.len();
        Self {
            succeeded,
            failed,
            total_count: success_count + failure_count,
            success_count,
            failure_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LocationInfo;

    #[test]
    fn test_response_constructors() {
        let ok: ServiceResponse<u32> = ServiceResponse::ok(7);
        assert!(ok.success);
        assert_eq!(ok.code, ResponseCode::Ok);
        assert_eq!(ok.data, Some(7));

        let missing: ServiceResponse<u32> = ServiceResponse::not_found("no such task");
        assert!(!missing.success);
        assert_eq!(missing.code, ResponseCode::NotFound);
        assert!(missing.data.is_none());
        assert_eq!(missing.message, "no such task");
    }

    #[test]
    fn test_board_alert_view_has_empty_component_fields() {
        let alert = Alert::board(
            "alert-1",
            LocationInfo {
                board_address: "192.168.1.103".to_string(),
                ..Default::default()
            },
            &["fault".to_string()],
        );
        let view = AlertView::from(&alert);
        assert_eq!(view.kind, 0);
        assert_eq!(view.board_address, "192.168.1.103");
        assert!(view.pipeline_uuid.is_empty());
        assert!(view.task_id.is_empty());
    }

    #[test]
    fn test_deploy_result_counts() {
        let result = DeployResult::new(
            vec![PipelineOpResult::default(), PipelineOpResult::default()],
            vec![PipelineOpResult::default()],
        );
        assert_eq!(result.total_count, 3);
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
    }
}
