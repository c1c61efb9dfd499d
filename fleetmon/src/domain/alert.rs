//! Alert aggregate: board faults and component (task) faults.

use super::{unix_now, AlertKind, LocationInfo, MAX_ALERT_MESSAGES};

/// One timestamped line of an alert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertMessage {
    pub text: String,
    pub timestamp: u64,
}

/// Pipeline/service/task triple carried only by component alerts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentRef {
    pub pipeline_name: String,
    pub pipeline_uuid: String,
    pub service_name: String,
    pub service_uuid: String,
    pub task_id: String,
}

/// A recorded anomaly with an acknowledgement bit.
///
/// Board alerts relate to a board address; component alerts relate to a
/// task id and additionally carry the owning pipeline/service identifiers.
/// The `component` field is `None` exactly when the kind is Board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alert {
    uuid: String,
    kind: AlertKind,
    timestamp: u64,
    acknowledged: bool,
    related_entity: String,
    messages: Vec<AlertMessage>,
    location: LocationInfo,
    component: Option<ComponentRef>,
}

impl Alert {
    /// Create a board alert for the board at `location`.
    pub fn board(uuid: impl Into<String>, location: LocationInfo, messages: &[String]) -> Self {
        let mut alert = Self {
            uuid: uuid.into(),
            kind: AlertKind::Board,
            timestamp: unix_now(),
            related_entity: location.board_address.clone(),
            location,
            ..Default::default()
        };
        for text in messages {
            if !alert.add_message(text) {
                break;
            }
        }
        alert
    }

    /// Create a component alert for a task.
    pub fn component(
        uuid: impl Into<String>,
        component: ComponentRef,
        location: LocationInfo,
        messages: &[String],
    ) -> Self {
        let mut alert = Self {
            uuid: uuid.into(),
            kind: AlertKind::Component,
            timestamp: unix_now(),
            related_entity: component.task_id.clone(),
            location,
            component: Some(component),
            ..Default::default()
        };
        for text in messages {
            if !alert.add_message(text) {
                break;
            }
        }
        alert
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[cfg(test)]
    pub(crate) fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Board address for board alerts, task id for component alerts.
    pub fn related_entity(&self) -> &str {
        &self.related_entity
    }

    pub fn messages(&self) -> &[AlertMessage] {
        &self.messages
    }

    pub fn location(&self) -> &LocationInfo {
        &self.location
    }

    /// Component fields; `None` for board alerts.
    pub fn component_ref(&self) -> Option<&ComponentRef> {
        self.component.as_ref()
    }

    /// Append a message; returns false once the bound is reached.
    pub fn add_message(&mut self, text: &str) -> bool {
        if self.messages.len() >= MAX_ALERT_MESSAGES {
            return false;
        }
        self.messages.push(AlertMessage {
            text: text.to_string(),
            timestamp: unix_now(),
        });
        true
    }

    /// Mark the alert as seen by an operator. Idempotent.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    /// Seconds since the alert was raised, measured against `now`.
    pub fn age_seconds(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }
}
