//! Wire shapes of the backend JSON API.
//!
//! These are our own deserialization targets, decoupled from the domain
//! model; the collector translates them into domain entities. Every field
//! defaults when missing (strings to empty, numbers to zero), matching the
//! backend's loose contract.

use serde::{Deserialize, Serialize};

/// Envelope around both inventory feeds: `{"data": [...]}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One task entry inside a board report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardTaskReport {
    #[serde(rename = "taskID")]
    pub task_id: String,
    #[serde(rename = "taskStatus")]
    pub task_status: String,
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "serviceUUID")]
    pub service_uuid: String,
    #[serde(rename = "stackName")]
    pub stack_name: String,
    #[serde(rename = "stackUUID")]
    pub stack_uuid: String,
}

/// One board entry from `GET /boardinfo`.
///
/// `board_status` 0 means normal; any other value means abnormal.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardReport {
    #[serde(rename = "chassisName")]
    pub chassis_name: String,
    #[serde(rename = "chassisNumber")]
    pub chassis_number: i32,
    #[serde(rename = "boardName")]
    pub board_name: String,
    #[serde(rename = "boardNumber")]
    pub board_number: i32,
    #[serde(rename = "boardType")]
    pub board_type: i32,
    #[serde(rename = "boardAddress")]
    pub board_address: String,
    #[serde(rename = "boardStatus")]
    pub board_status: i32,
    #[serde(rename = "taskInfos")]
    pub task_infos: Vec<BoardTaskReport>,
}

/// One label entry inside a pipeline report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelReport {
    #[serde(rename = "labelName")]
    pub label_name: String,
    #[serde(rename = "labelUUID")]
    pub label_uuid: String,
}

/// One task entry inside a service report, with resource numerics.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceTaskReport {
    #[serde(rename = "taskID")]
    pub task_id: String,
    #[serde(rename = "taskStatus")]
    pub task_status: String,
    #[serde(rename = "cpuCores")]
    pub cpu_cores: f32,
    #[serde(rename = "cpuUsed")]
    pub cpu_used: f32,
    #[serde(rename = "cpuUsage")]
    pub cpu_usage: f32,
    #[serde(rename = "memorySize")]
    pub memory_size: f32,
    #[serde(rename = "memoryUsed")]
    pub memory_used: f32,
    #[serde(rename = "memoryUsage")]
    pub memory_usage: f32,
    #[serde(rename = "netReceive")]
    pub net_receive: f32,
    #[serde(rename = "netSent")]
    pub net_sent: f32,
    #[serde(rename = "gpuMemUsed")]
    pub gpu_mem_used: f32,
    #[serde(rename = "chassisName")]
    pub chassis_name: String,
    #[serde(rename = "chassisNumber")]
    pub chassis_number: i32,
    #[serde(rename = "boardName")]
    pub board_name: String,
    #[serde(rename = "boardNumber")]
    pub board_number: i32,
    #[serde(rename = "boardAddress")]
    pub board_address: String,
}

/// One service entry inside a pipeline report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceReport {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(rename = "serviceUUID")]
    pub service_uuid: String,
    #[serde(rename = "serviceStatus")]
    pub service_status: i32,
    #[serde(rename = "serviceType")]
    pub service_type: i32,
    #[serde(rename = "taskInfos")]
    pub task_infos: Vec<ServiceTaskReport>,
}

/// One pipeline entry from `GET /stackinfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineReport {
    #[serde(rename = "stackName")]
    pub stack_name: String,
    #[serde(rename = "stackUUID")]
    pub stack_uuid: String,
    #[serde(rename = "stackDeployStatus")]
    pub stack_deploy_status: i32,
    #[serde(rename = "stackRunningStatus")]
    pub stack_running_status: i32,
    #[serde(rename = "stackLabelInfos")]
    pub stack_label_infos: Vec<LabelReport>,
    #[serde(rename = "serviceInfos")]
    pub service_infos: Vec<ServiceReport>,
}

/// Request body for deploy/undeploy.
#[derive(Debug, Serialize)]
pub(crate) struct DeployRequest<'a> {
    #[serde(rename = "stackLabels")]
    pub stack_labels: &'a [String],
}

/// Per-pipeline outcome line in a deploy/undeploy response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineOpResult {
    #[serde(rename = "stackName")]
    pub stack_name: String,
    #[serde(rename = "stackUUID")]
    pub stack_uuid: String,
    pub message: String,
}

/// Response of a deploy/undeploy call: per-pipeline success/failure lists.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeployOutcome {
    #[serde(rename = "successStackInfos")]
    pub success: Vec<PipelineOpResult>,
    #[serde(rename = "failureStackInfos")]
    pub failure: Vec<PipelineOpResult>,
}
