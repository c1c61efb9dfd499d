//! Pipeline aggregate: services, tasks, labels and derived running status.

use std::collections::BTreeMap;

use super::{
    DeployStatus, ResourceUsage, RunningStatus, ServiceKind, ServiceStatus, TaskDetail,
    MAX_LABELS_PER_PIPELINE,
};

/// A tag on a pipeline used for batch deploy/undeploy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineLabel {
    pub name: String,
    pub uuid: String,
}

/// An algorithm component within a pipeline, hosting tasks keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub uuid: String,
    pub name: String,
    pub status: ServiceStatus,
    pub kind: ServiceKind,
    tasks: BTreeMap<String, TaskDetail>,
}

impl Service {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_abnormal(&self) -> bool {
        self.status == ServiceStatus::Abnormal
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskDetail> {
        &self.tasks
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Insert or replace a task by id.
    pub fn upsert_task(&mut self, task: TaskDetail) {
        self.tasks.insert(task.task_id.clone(), task);
    }

    pub fn find_task(&self, task_id: &str) -> Option<&TaskDetail> {
        self.tasks.get(task_id)
    }

    /// Sum of all task resources with recomputed usage percentages.
    pub fn aggregate_resources(&self) -> ResourceUsage {
        let mut total = ResourceUsage::default();
        for task in self.tasks.values() {
            total.accumulate(&task.resources);
        }
        total.recompute_usage();
        total
    }
}

/// A business pipeline: the top-level deployable unit.
///
/// The label list is bounded at [`MAX_LABELS_PER_PIPELINE`]; services are an
/// open map keyed by service UUID. The running status is derived from the
/// owned services, never stored independently of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub uuid: String,
    pub name: String,
    pub deploy_status: DeployStatus,
    running_status: RunningStatus,
    labels: Vec<PipelineLabel>,
    services: BTreeMap<String, Service>,
}

impl Pipeline {
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn running_status(&self) -> RunningStatus {
        self.running_status
    }

    pub fn is_deployed(&self) -> bool {
        self.deploy_status == DeployStatus::Deployed
    }

    pub fn is_running_normally(&self) -> bool {
        self.running_status == RunningStatus::Normal
    }

    pub fn labels(&self) -> &[PipelineLabel] {
        &self.labels
    }

    /// Append a label; returns false once the bound is reached.
    pub fn add_label(&mut self, label: PipelineLabel) -> bool {
        if self.labels.len() >= MAX_LABELS_PER_PIPELINE {
            return false;
        }
        self.labels.push(label);
        true
    }

    pub fn has_label(&self, label_uuid: &str) -> bool {
        self.labels.iter().any(|l| l.uuid == label_uuid)
    }

    pub fn services(&self) -> &BTreeMap<String, Service> {
        &self.services
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn task_count(&self) -> usize {
        self.services.values().map(|s| s.task_count()).sum()
    }

    /// Insert or replace a service, then re-derive the running status.
    pub fn upsert_service(&mut self, service: Service) {
        self.services.insert(service.uuid.clone(), service);
        self.recalculate_running_status();
    }

    pub fn find_service(&self, service_uuid: &str) -> Option<&Service> {
        self.services.get(service_uuid)
    }

    /// First task with the given id across all services.
    pub fn find_task(&self, task_id: &str) -> Option<&TaskDetail> {
        self.services.values().find_map(|s| s.find_task(task_id))
    }

    /// Resource usage of the task with the given id, if it runs here.
    pub fn task_resources(&self, task_id: &str) -> Option<ResourceUsage> {
        self.find_task(task_id).map(|t| t.resources)
    }

    /// Sum of all service resources with recomputed usage percentages.
    pub fn aggregate_resources(&self) -> ResourceUsage {
        let mut total = ResourceUsage::default();
        for service in self.services.values() {
            for task in service.tasks().values() {
                total.accumulate(&task.resources);
            }
        }
        total.recompute_usage();
        total
    }

    /// Abnormal iff any owned service is abnormal; Normal otherwise,
    /// including when the pipeline owns no services.
    fn recalculate_running_status(&mut self) {
        self.running_status = if self.services.values().any(Service::is_abnormal) {
            RunningStatus::Abnormal
        } else {
            RunningStatus::Normal
        };
    }
}
