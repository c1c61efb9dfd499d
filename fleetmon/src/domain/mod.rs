//! Domain model for the monitored hardware fleet.
//!
//! The installation is a fixed topology: nine chassis, fourteen slots each.
//! Boards are identified by IPv4 address; business pipelines (and the
//! services and tasks inside them) are identified by UUID strings assigned
//! by the backend. Alerts are identified by locally generated UUIDs.
//!
//! All entities here are plain owned data. The stores in [`crate::store`]
//! hand out copies (or frozen `Arc` snapshots); nothing in the domain layer
//! is shared mutable state.

mod alert;
mod board;
mod chassis;
mod pipeline;
mod task;

pub use alert::{Alert, AlertMessage, ComponentRef};
pub use board::{Board, TaskSummary};
pub use chassis::{Chassis, ChassisGrid};
pub use pipeline::{Pipeline, PipelineLabel, Service};
pub use task::{LocationInfo, ResourceUsage, TaskDetail};

/// Number of chassis in the installation.
pub const CHASSIS_COUNT: usize = 9;

/// Number of board slots per chassis.
pub const BOARDS_PER_CHASSIS: usize = 14;

/// Maximum task summaries carried per board; excess is truncated on update.
pub const MAX_TASKS_PER_BOARD: usize = 8;

/// Maximum labels carried per pipeline.
pub const MAX_LABELS_PER_PIPELINE: usize = 8;

/// Maximum messages carried per alert.
pub const MAX_ALERT_MESSAGES: usize = 16;

/// What a board in a given slot is for.
///
/// The slot number alone decides the kind: slots 6 and 7 carry switch
/// boards, slots 13 and 14 carry power boards, everything else computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardKind {
    #[default]
    Compute,
    Switch,
    Power,
}

impl BoardKind {
    /// Derive the board kind from a 1-based slot number.
    pub fn for_slot(slot: u8) -> Self {
        match slot {
            6 | 7 => BoardKind::Switch,
            13 | 14 => BoardKind::Power,
            _ => BoardKind::Compute,
        }
    }
}

/// Operational status of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardStatus {
    /// Initial state before the first collector commit.
    #[default]
    Unknown,
    Normal,
    Abnormal,
    /// The backend stopped reporting this board.
    Offline,
}

impl BoardStatus {
    /// Numeric code used by DTOs and the webhook surface.
    pub fn code(self) -> i32 {
        match self {
            BoardStatus::Unknown => -1,
            BoardStatus::Normal => 0,
            BoardStatus::Abnormal => 1,
            BoardStatus::Offline => 2,
        }
    }
}

/// Deploy state of a pipeline, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployStatus {
    #[default]
    Undeployed,
    Deployed,
}

impl DeployStatus {
    pub fn from_code(code: i32) -> Self {
        if code == 1 {
            DeployStatus::Deployed
        } else {
            DeployStatus::Undeployed
        }
    }

    pub fn code(self) -> i32 {
        match self {
            DeployStatus::Undeployed => 0,
            DeployStatus::Deployed => 1,
        }
    }
}

/// Running state of a pipeline.
///
/// Derived, not reported: a pipeline is Abnormal iff any of its services is
/// Abnormal, Normal otherwise (including when it owns no services).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningStatus {
    #[default]
    Normal,
    Abnormal,
}

impl RunningStatus {
    pub fn code(self) -> i32 {
        match self {
            RunningStatus::Normal => 1,
            RunningStatus::Abnormal => 2,
        }
    }
}

/// Status of a service (algorithm component) inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    #[default]
    Disabled,
    Enabled,
    Running,
    Abnormal,
}

impl ServiceStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ServiceStatus::Enabled,
            2 => ServiceStatus::Running,
            3 => ServiceStatus::Abnormal,
            _ => ServiceStatus::Disabled,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ServiceStatus::Disabled => 0,
            ServiceStatus::Enabled => 1,
            ServiceStatus::Running => 2,
            ServiceStatus::Abnormal => 3,
        }
    }
}

/// Kind of a service within a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceKind {
    #[default]
    Normal,
    /// A shared component referenced by an ordinary pipeline.
    SharedReference,
    /// A component owned by a shared pipeline.
    SharedOwned,
}

impl ServiceKind {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ServiceKind::SharedReference,
            2 => ServiceKind::SharedOwned,
            _ => ServiceKind::Normal,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ServiceKind::Normal => 0,
            ServiceKind::SharedReference => 1,
            ServiceKind::SharedOwned => 2,
        }
    }
}

/// Kind of a recorded alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertKind {
    /// A board fault; the related entity is the board address.
    #[default]
    Board,
    /// A component (task) fault; the related entity is the task id.
    Component,
}

impl AlertKind {
    pub fn code(self) -> i32 {
        match self {
            AlertKind::Board => 0,
            AlertKind::Component => 1,
        }
    }
}

/// Current Unix time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current Unix time in milliseconds.
pub(crate) fn unix_now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_kind_for_slot() {
        assert_eq!(BoardKind::for_slot(1), BoardKind::Compute);
        assert_eq!(BoardKind::for_slot(5), BoardKind::Compute);
        assert_eq!(BoardKind::for_slot(6), BoardKind::Switch);
        assert_eq!(BoardKind::for_slot(7), BoardKind::Switch);
        assert_eq!(BoardKind::for_slot(8), BoardKind::Compute);
        assert_eq!(BoardKind::for_slot(12), BoardKind::Compute);
        assert_eq!(BoardKind::for_slot(13), BoardKind::Power);
        assert_eq!(BoardKind::for_slot(14), BoardKind::Power);
    }

    #[test]
    fn test_status_codes_round_trip() {
        assert_eq!(DeployStatus::from_code(1), DeployStatus::Deployed);
        assert_eq!(DeployStatus::from_code(0), DeployStatus::Undeployed);
        assert_eq!(ServiceStatus::from_code(3), ServiceStatus::Abnormal);
        assert_eq!(ServiceStatus::from_code(99), ServiceStatus::Disabled);
        assert_eq!(ServiceKind::from_code(2), ServiceKind::SharedOwned);
        assert_eq!(BoardStatus::Offline.code(), 2);
        assert_eq!(BoardStatus::Unknown.code(), -1);
    }
}
