//! Periodic collector: poll the backend, transform, commit.
//!
//! Each tick runs two independent phases:
//!
//! 1. **Board sync**: fetch the board feed, rebuild the chassis grid from
//!    the current snapshot, and commit it to the chassis store. Boards the
//!    backend stopped reporting go offline.
//! 2. **Pipeline sync**: fetch the pipeline feed, translate it into
//!    pipeline aggregates, and merge-save the batch into the pipeline
//!    store.
//!
//! A failure in either phase is absorbed: the tick logs and moves on, and
//! readers keep seeing the last-known-good state. One phase failing never
//! skips the other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BoardReport, PipelineReport};
use crate::domain::{
    LocationInfo, Pipeline, PipelineLabel, ResourceUsage, Service, ServiceKind, ServiceStatus,
    TaskDetail, TaskSummary, DeployStatus,
};
use crate::store::{ChassisStore, PipelineStore};

/// Default collection period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// The snapshot pipeline. Sole writer of the chassis and pipeline stores.
pub struct Collector<C> {
    backend: Arc<C>,
    chassis: Arc<ChassisStore>,
    pipelines: Arc<PipelineStore>,
    interval: Duration,
}

impl<C: BackendClient> Collector<C> {
    pub fn new(
        backend: Arc<C>,
        chassis: Arc<ChassisStore>,
        pipelines: Arc<PipelineStore>,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            chassis,
            pipelines,
            interval,
        }
    }

    /// Run until the token is cancelled.
    ///
    /// The first collection happens immediately, then once per interval.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Collector starting");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Collector shutting down");
                    break;
                }

                _ = ticker.tick() => {
                    self.collect_once().await;
                }
            }
        }
    }

    /// One full tick: board sync, then pipeline sync.
    ///
    /// Public so tests (and a manual trigger) can drive single collections.
    pub async fn collect_once(&self) {
        self.sync_boards().await;
        self.sync_pipelines().await;
    }

    /// Phase A: board feed into the chassis store.
    async fn sync_boards(&self) {
        let reports = match self.backend.get_board_info().await {
            Ok(reports) => reports,
            Err(e) => {
                warn!(error = %e, "Board sync skipped, keeping last snapshot");
                return;
            }
        };

        let mut grid = (*self.chassis.snapshot()).clone();

        let reported: HashMap<&str, &BoardReport> = reports
            .iter()
            .map(|r| (r.board_address.as_str(), r))
            .collect();

        let mut updated = 0usize;
        let mut offline = 0usize;
        for chassis in grid.chassis_mut() {
            if !chassis.is_initialized() {
                continue;
            }
            for board in chassis.boards_mut() {
                match reported.get(board.address()) {
                    Some(&report) => {
                        board.apply_report(report.board_status, convert_tasks(report));
                        updated += 1;
                    }
                    None => {
                        board.mark_offline();
                        offline += 1;
                    }
                }
            }
        }

        self.chassis.commit(grid);
        debug!(updated, offline, "Board sync committed");
    }

    /// Phase B: pipeline feed into the pipeline store.
    async fn sync_pipelines(&self) {
        let reports = match self.backend.get_pipeline_info().await {
            Ok(reports) => reports,
            Err(e) => {
                warn!(error = %e, "Pipeline sync skipped, keeping last population");
                return;
            }
        };

        let count = reports.len();
        let pipelines: Vec<Pipeline> = reports.into_iter().map(convert_pipeline).collect();
        self.pipelines.save_all(pipelines);
        debug!(pipelines = count, "Pipeline sync committed");
    }
}

/// Board-feed task entries into board-side task summaries.
fn convert_tasks(report: &BoardReport) -> Vec<TaskSummary> {
    report
        .task_infos
        .iter()
        .map(|t| TaskSummary {
            task_id: t.task_id.clone(),
            task_status: t.task_status.clone(),
            service_name: t.service_name.clone(),
            service_uuid: t.service_uuid.clone(),
            pipeline_name: t.stack_name.clone(),
            pipeline_uuid: t.stack_uuid.clone(),
        })
        .collect()
}

/// One pipeline-feed entry into a pipeline aggregate.
///
/// Labels are truncated at the domain bound; the running status is derived
/// from the translated services rather than taken from the feed.
fn convert_pipeline(report: PipelineReport) -> Pipeline {
    let mut pipeline = Pipeline::new(report.stack_uuid, report.stack_name);
    pipeline.deploy_status = DeployStatus::from_code(report.stack_deploy_status);

    for label in report.stack_label_infos {
        if !pipeline.add_label(PipelineLabel {
            name: label.label_name,
            uuid: label.label_uuid,
        }) {
            break;
        }
    }

    for service_report in report.service_infos {
        let mut service = Service::new(service_report.service_uuid, service_report.service_name);
        service.status = ServiceStatus::from_code(service_report.service_status);
        service.kind = ServiceKind::from_code(service_report.service_type);

        for task_report in service_report.task_infos {
            let mut task = TaskDetail::new(task_report.task_id);
            task.task_status = task_report.task_status;
            task.board_address = task_report.board_address.clone();
            task.resources = ResourceUsage {
                cpu_cores: task_report.cpu_cores,
                cpu_used: task_report.cpu_used,
                cpu_usage_pct: task_report.cpu_usage,
                memory_size: task_report.memory_size,
                memory_used: task_report.memory_used,
                memory_usage_pct: task_report.memory_usage,
                net_rx: task_report.net_receive,
                net_tx: task_report.net_sent,
                gpu_mem_used: task_report.gpu_mem_used,
            };
            task.location = LocationInfo {
                chassis_name: task_report.chassis_name,
                chassis_number: task_report.chassis_number,
                board_name: task_report.board_name,
                board_number: task_report.board_number,
                board_address: task_report.board_address,
            };
            service.upsert_task(task);
        }

        pipeline.upsert_service(service);
    }

    pipeline
}
