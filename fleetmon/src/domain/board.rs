//! Board entity and the per-board task summary.

use serde::Serialize;

use super::{BoardKind, BoardStatus, MAX_TASKS_PER_BOARD};

/// Minimal identifying tuple for a task running on a board.
///
/// This is the board-side view used by the fleet snapshot and the state
/// broadcast; the full per-task resource numerics live on the pipeline side
/// as [`super::TaskDetail`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub task_status: String,
    pub service_name: String,
    pub service_uuid: String,
    pub pipeline_name: String,
    pub pipeline_uuid: String,
}

/// One card in a chassis slot, identified by IPv4 address.
///
/// The address and slot are fixed at construction by the topology factory;
/// status and task list change only through collector commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    address: String,
    slot: u8,
    kind: BoardKind,
    status: BoardStatus,
    tasks: Vec<TaskSummary>,
}

impl Board {
    /// Create a board for a slot; the kind is derived from the slot number.
    pub fn new(address: impl Into<String>, slot: u8) -> Self {
        Self {
            address: address.into(),
            slot,
            kind: BoardKind::for_slot(slot),
            status: BoardStatus::Unknown,
            tasks: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn kind(&self) -> BoardKind {
        self.kind
    }

    pub fn status(&self) -> BoardStatus {
        self.status
    }

    pub fn tasks(&self) -> &[TaskSummary] {
        &self.tasks
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Only compute boards host tasks; switch and power boards never do.
    pub fn can_run_tasks(&self) -> bool {
        self.kind == BoardKind::Compute
    }

    /// Abnormal or offline.
    pub fn is_abnormal(&self) -> bool {
        matches!(self.status, BoardStatus::Abnormal | BoardStatus::Offline)
    }

    /// Reachable by the backend: normal or abnormal, but reporting.
    pub fn is_online(&self) -> bool {
        matches!(self.status, BoardStatus::Normal | BoardStatus::Abnormal)
    }

    /// Apply one backend report to this board.
    ///
    /// Status code 0 maps to Normal, anything else to Abnormal. The task
    /// list replaces the previous one, truncated to [`MAX_TASKS_PER_BOARD`].
    /// Non-compute boards always end up with an empty task list regardless
    /// of what the backend reported.
    pub fn apply_report(&mut self, status_code: i32, tasks: Vec<TaskSummary>) {
        self.status = if status_code == 0 {
            BoardStatus::Normal
        } else {
            BoardStatus::Abnormal
        };

        if !self.can_run_tasks() {
            self.tasks.clear();
            return;
        }

        self.tasks = tasks;
        self.tasks.truncate(MAX_TASKS_PER_BOARD);
    }

    /// Mark the board offline with no tasks.
    ///
    /// Called when the backend's board report omits this address.
    pub fn mark_offline(&mut self) {
        self.status = BoardStatus::Offline;
        self.tasks.clear();
    }
}
