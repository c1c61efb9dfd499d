//! Pipeline-side task detail and its value objects.

/// Where a task (or an alerting board) lives in the installation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationInfo {
    pub chassis_name: String,
    pub chassis_number: i32,
    pub board_name: String,
    pub board_number: i32,
    pub board_address: String,
}

/// Resource consumption of a single task.
///
/// All values come from the backend verbatim; the only expectation is
/// non-negativity. Memory figures are bytes, network figures are rates as
/// reported, `cpu_usage_pct` / `memory_usage_pct` are percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceUsage {
    pub cpu_cores: f32,
    pub cpu_used: f32,
    pub cpu_usage_pct: f32,
    pub memory_size: f32,
    pub memory_used: f32,
    pub memory_usage_pct: f32,
    pub net_rx: f32,
    pub net_tx: f32,
    pub gpu_mem_used: f32,
}

impl ResourceUsage {
    /// Add another task's resources into this accumulator.
    ///
    /// Usage percentages are not summed; callers recompute them from the
    /// accumulated totals via [`ResourceUsage::recompute_usage`].
    pub fn accumulate(&mut self, other: &ResourceUsage) {
        self.cpu_cores += other.cpu_cores;
        self.cpu_used += other.cpu_used;
        self.memory_size += other.memory_size;
        self.memory_used += other.memory_used;
        self.net_rx += other.net_rx;
        self.net_tx += other.net_tx;
        self.gpu_mem_used += other.gpu_mem_used;
    }

    /// Recompute the usage percentages from the accumulated totals.
    pub fn recompute_usage(&mut self) {
        self.cpu_usage_pct = if self.cpu_cores > 0.0 {
            (self.cpu_used / self.cpu_cores) * 100.0
        } else {
            0.0
        };
        self.memory_usage_pct = if self.memory_size > 0.0 {
            (self.memory_used / self.memory_size) * 100.0
        } else {
            0.0
        };
    }
}

/// Full detail of a task as reported through the pipeline feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDetail {
    pub task_id: String,
    pub task_status: String,
    pub board_address: String,
    pub resources: ResourceUsage,
    pub location: LocationInfo,
}

impl TaskDetail {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }
}
