//! Alert application service: ingestion, acknowledgement, cleanup.
//!
//! Sits between the inbound surfaces (webhook endpoint, command listener)
//! and the alert store. Generates alert UUIDs of the form
//! `alert-{kind}-{unix_s}-{6 hex}`; collisions are negligible at the
//! expected alert rate, and the format can be swapped for a full UUID
//! without touching any contract.

use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::domain::{unix_now, Alert, ComponentRef, LocationInfo};
use crate::dto::ServiceResponse;
use crate::store::AlertStore;

/// Alert ingestion and lifecycle operations.
#[derive(Clone)]
pub struct AlertService {
    store: Arc<AlertStore>,
}

impl AlertService {
    pub fn new(store: Arc<AlertStore>) -> Self {
        Self { store }
    }

    /// Record a board fault. Returns the generated alert UUID.
    pub fn handle_board_alert(
        &self,
        location: LocationInfo,
        messages: &[String],
    ) -> ServiceResponse<String> {
        let uuid = generate_alert_uuid("board");
        let alert = Alert::board(&uuid, location, messages);
        info!(
            alert = %uuid,
            board = %alert.location().board_address,
            messages = messages.len(),
            "Board alert recorded"
        );
        self.store.save(alert);
        ServiceResponse::ok_with(uuid, "board alert recorded")
    }

    /// Record a component (task) fault. Returns the generated alert UUID.
    pub fn handle_component_alert(
        &self,
        component: ComponentRef,
        location: LocationInfo,
        messages: &[String],
    ) -> ServiceResponse<String> {
        let uuid = generate_alert_uuid("component");
        let alert = Alert::component(&uuid, component, location, messages);
        info!(
            alert = %uuid,
            task = %alert.related_entity(),
            "Component alert recorded"
        );
        self.store.save(alert);
        ServiceResponse::ok_with(uuid, "component alert recorded")
    }

    /// Acknowledge one alert by UUID.
    pub fn acknowledge(&self, uuid: &str) -> ServiceResponse<bool> {
        if self.store.acknowledge(uuid) {
            ServiceResponse::ok_with(true, "alert acknowledged")
        } else {
            ServiceResponse::not_found(format!("alert {uuid} not found"))
        }
    }

    /// Acknowledge a batch; the count reflects one consistent mass update.
    pub fn acknowledge_many(&self, uuids: &[String]) -> ServiceResponse<usize> {
        if uuids.is_empty() {
            return ServiceResponse::invalid_argument("alert list must not be empty");
        }
        let count = self.store.acknowledge_many(uuids);
        ServiceResponse::ok_with(count, format!("{count} alerts acknowledged"))
    }

    /// Remove one alert by UUID.
    pub fn remove(&self, uuid: &str) -> ServiceResponse<bool> {
        if self.store.remove(uuid) {
            ServiceResponse::ok_with(true, "alert removed")
        } else {
            ServiceResponse::not_found(format!("alert {uuid} not found"))
        }
    }

    /// Drop acknowledged alerts older than `max_age_seconds`.
    pub fn cleanup_expired(&self, max_age_seconds: u64) -> ServiceResponse<usize> {
        let count = self.store.remove_expired(max_age_seconds);
        if count > 0 {
            info!(removed = count, "Expired alerts cleaned up");
        }
        ServiceResponse::ok_with(count, format!("{count} expired alerts removed"))
    }
}

/// `alert-{kind}-{unix_s}-{6 hex}` with a 24-bit random suffix.
fn generate_alert_uuid(kind: &str) -> String {
    let suffix: u32 = rand::rng().random_range(0..0x100_0000);
    format!("alert-{kind}-{}-{suffix:06x}", unix_now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertKind;
    use crate::dto::ResponseCode;

    fn service() -> (AlertService, Arc<AlertStore>) {
        let store = Arc::new(AlertStore::new());
        (AlertService::new(Arc::clone(&store)), store)
    }

    fn location(address: &str) -> LocationInfo {
        LocationInfo {
            board_address: address.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_uuid_format() {
        let uuid = generate_alert_uuid("board");
        let parts: Vec<&str> = uuid.split('-').collect();
        assert_eq!(parts[0], "alert");
        assert_eq!(parts[1], "board");
        assert!(parts[2].parse::<u64>().is_ok());
        assert_eq!(parts[3].len(), 6);
        assert!(u32::from_str_radix(parts[3], 16).is_ok());
    }

    #[test]
    fn test_board_alert_round_trip() {
        let (service, store) = service();
        let response =
            service.handle_board_alert(location("192.168.1.103"), &["cpu hot".to_string()]);
        assert!(response.success);

        let uuid = response.data.unwrap();
        let alert = store.find_by_uuid(&uuid).unwrap();
        assert_eq!(alert.kind(), AlertKind::Board);
        assert_eq!(alert.related_entity(), "192.168.1.103");
    }

    #[test]
    fn test_component_alert_round_trip() {
        let (service, store) = service();
        let component = ComponentRef {
            task_id: "task-1".to_string(),
            pipeline_uuid: "stack-1".to_string(),
            ..Default::default()
        };
        let response = service.handle_component_alert(component, LocationInfo::default(), &[]);
        assert!(response.success);
        assert_eq!(store.count_component_alerts(), 1);
    }

    #[test]
    fn test_acknowledge_paths() {
        let (service, _store) = service();
        let uuid = service
            .handle_board_alert(location("a"), &[])
            .data
            .unwrap();

        assert!(service.acknowledge(&uuid).success);
        // Acknowledging again still succeeds.
        assert!(service.acknowledge(&uuid).success);

        let missing = service.acknowledge("alert-board-0-000000");
        assert!(!missing.success);
        assert_eq!(missing.code, ResponseCode::NotFound);
    }

    #[test]
    fn test_acknowledge_many_rejects_empty() {
        let (service, _store) = service();
        let response = service.acknowledge_many(&[]);
        assert!(!response.success);
        assert_eq!(response.code, ResponseCode::InvalidArgument);
    }

    #[test]
    fn test_remove_and_cleanup() {
        let (service, store) = service();
        let uuid = service.handle_board_alert(location("a"), &[]).data.unwrap();

        assert!(service.remove(&uuid).success);
        assert!(!service.remove(&uuid).success);

        // Fresh unacknowledged alert survives any sweep.
        service.handle_board_alert(location("b"), &[]);
        let cleaned = service.cleanup_expired(0);
        assert_eq!(cleaned.data.unwrap(), 0);
        assert_eq!(store.count_active(), 1);
    }
}
