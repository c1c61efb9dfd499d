//! Query service: read-side views over the three stores.
//!
//! Pure reads through the stores' reader contracts; every answer is an
//! owned DTO, so callers never retain anything tied to store internals.

use std::sync::Arc;

use crate::dto::{
    AlertList, AlertView, ChassisView, PipelineList, PipelineView, ServiceResponse,
    SystemOverview, TaskResourceView,
};
use crate::store::{AlertStore, ChassisStore, PipelineStore};

/// Read-only facade over the chassis, pipeline and alert stores.
#[derive(Clone)]
pub struct QueryService {
    chassis: Arc<ChassisStore>,
    pipelines: Arc<PipelineStore>,
    alerts: Arc<AlertStore>,
}

impl QueryService {
    pub fn new(
        chassis: Arc<ChassisStore>,
        pipelines: Arc<PipelineStore>,
        alerts: Arc<AlertStore>,
    ) -> Self {
        Self {
            chassis,
            pipelines,
            alerts,
        }
    }

    /// Whole-fleet overview: every initialised chassis plus totals.
    pub fn system_overview(&self) -> ServiceResponse<SystemOverview> {
        let snapshot = self.chassis.snapshot();

        let chassis: Vec<ChassisView> =
            snapshot.iter_initialized().map(ChassisView::from).collect();

        ServiceResponse::ok(SystemOverview {
            total_chassis: chassis.len(),
            chassis,
            total_boards: snapshot.count_total_boards(),
            normal_boards: snapshot.count_normal_boards(),
            abnormal_boards: snapshot.count_abnormal_boards(),
            offline_boards: snapshot.count_offline_boards(),
            total_tasks: snapshot.count_tasks(),
        })
    }

    pub fn chassis_by_number(&self, number: u8) -> ServiceResponse<ChassisView> {
        match self.chassis.find_by_number(number) {
            Some(chassis) => ServiceResponse::ok(ChassisView::from(&chassis)),
            None => ServiceResponse::not_found(format!("chassis {number} not found")),
        }
    }

    pub fn chassis_by_board_address(&self, address: &str) -> ServiceResponse<ChassisView> {
        match self.chassis.find_by_board_address(address) {
            Some(chassis) => ServiceResponse::ok(ChassisView::from(&chassis)),
            None => ServiceResponse::not_found(format!("no board with address {address}")),
        }
    }

    pub fn all_pipelines(&self) -> ServiceResponse<PipelineList> {
        let pipelines = self.pipelines.get_all();
        ServiceResponse::ok(PipelineList {
            total: pipelines.len(),
            deployed: self.pipelines.count_deployed(),
            running_normally: self.pipelines.count_running_normally(),
            abnormal: self.pipelines.count_abnormal(),
            pipelines: pipelines.iter().map(PipelineView::from).collect(),
        })
    }

    pub fn pipeline_by_uuid(&self, uuid: &str) -> ServiceResponse<PipelineView> {
        match self.pipelines.find_by_uuid(uuid) {
            Some(pipeline) => ServiceResponse::ok(PipelineView::from(&pipeline)),
            None => ServiceResponse::not_found(format!("pipeline {uuid} not found")),
        }
    }

    /// On-demand drill-down for one task's resource numerics.
    ///
    /// This is deliberately pull-based: per-task numerics are never part of
    /// the broadcast streams, only fetched when a consumer asks.
    pub fn task_resource(&self, task_id: &str) -> ServiceResponse<TaskResourceView> {
        let Some(pipeline) = self.pipelines.find_pipeline_by_task_id(task_id) else {
            return ServiceResponse::not_found(format!("task {task_id} not found"));
        };
        match pipeline.find_task(task_id) {
            Some(task) => ServiceResponse::ok(TaskResourceView::from_task(task)),
            None => ServiceResponse::not_found(format!("task {task_id} not found")),
        }
    }

    pub fn active_alerts(&self) -> ServiceResponse<AlertList> {
        let alerts = self.alerts.get_all_active();
        ServiceResponse::ok(AlertList {
            total: alerts.len(),
            unacknowledged: self.alerts.count_unacknowledged(),
            board_alerts: self.alerts.count_board_alerts(),
            component_alerts: self.alerts.count_component_alerts(),
            alerts: alerts.iter().map(AlertView::from).collect(),
        })
    }

    /// Alerts still waiting for an operator; feeds the alert broadcast.
    pub fn unacknowledged_alerts(&self) -> ServiceResponse<AlertList> {
        let alerts = self.alerts.get_unacknowledged();
        let board_alerts = alerts.iter().filter(|a| a.kind().code() == 0).count();
        ServiceResponse::ok(AlertList {
            total: alerts.len(),
            unacknowledged: alerts.len(),
            board_alerts,
            component_alerts: alerts.len() - board_alerts,
            alerts: alerts.iter().map(AlertView::from).collect(),
        })
    }
}
