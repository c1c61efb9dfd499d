//! Alert store: shared/exclusive map with acknowledgement and TTL expiry.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{unix_now, Alert, AlertKind};

/// Many-reader / many-writer map of active alerts, keyed by alert UUID.
///
/// Every operation is atomic with respect to every other;
/// [`AlertStore::acknowledge_many`] holds the exclusive lock across the
/// batch so the returned count reflects one consistent mass update.
///
/// Expiry only ever removes acknowledged alerts: an unacknowledged alert
/// survives any sweep regardless of age.
#[derive(Debug, Default)]
pub struct AlertStore {
    inner: RwLock<HashMap<String, Alert>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an alert by UUID.
    pub fn save(&self, alert: Alert) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(alert.uuid().to_string(), alert);
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(uuid).cloned()
    }

    /// All alerts currently held, ordered by timestamp then UUID.
    pub fn get_all_active(&self) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Alert> = map.values().cloned().collect();
        all.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.uuid().cmp(b.uuid()))
        });
        all
    }

    /// Alerts no operator has acknowledged yet.
    pub fn get_unacknowledged(&self) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<Alert> = map
            .values()
            .filter(|a| !a.is_acknowledged())
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.uuid().cmp(b.uuid()))
        });
        found
    }

    pub fn find_by_kind(&self, kind: AlertKind) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|a| a.kind() == kind).cloned().collect()
    }

    /// Alerts whose related entity (board address or task id) matches.
    pub fn find_by_entity(&self, entity_id: &str) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values()
            .filter(|a| a.related_entity() == entity_id)
            .cloned()
            .collect()
    }

    /// Board alerts raised for the given board address.
    pub fn find_by_board_address(&self, address: &str) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values()
            .filter(|a| a.kind() == AlertKind::Board && a.location().board_address == address)
            .cloned()
            .collect()
    }

    /// Component alerts raised for tasks of the given pipeline.
    pub fn find_by_pipeline_uuid(&self, pipeline_uuid: &str) -> Vec<Alert> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values()
            .filter(|a| {
                a.component_ref()
                    .is_some_and(|c| c.pipeline_uuid == pipeline_uuid)
            })
            .cloned()
            .collect()
    }

    pub fn count_active(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    pub fn count_unacknowledged(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|a| !a.is_acknowledged()).count()
    }

    pub fn count_board_alerts(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|a| a.kind() == AlertKind::Board).count()
    }

    pub fn count_component_alerts(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values()
            .filter(|a| a.kind() == AlertKind::Component)
            .count()
    }

    /// Acknowledge one alert. Returns whether the UUID was present;
    /// acknowledging an already-acknowledged alert succeeds as a no-op.
    pub fn acknowledge(&self, uuid: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match map.get_mut(uuid) {
            Some(alert) => {
                alert.acknowledge();
                true
            }
            None => false,
        }
    }

    /// Acknowledge a batch under one exclusive lock.
    ///
    /// Returns how many of the given UUIDs were present.
    pub fn acknowledge_many(&self, uuids: &[String]) -> usize {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut count = 0;
        for uuid in uuids {
            if let Some(alert) = map.get_mut(uuid) {
                alert.acknowledge();
                count += 1;
            }
        }
        count
    }

    /// Remove one alert; returns whether it existed.
    pub fn remove(&self, uuid: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(uuid).is_some()
    }

    /// Remove acknowledged alerts older than `max_age_seconds`.
    ///
    /// Unacknowledged alerts are never expired regardless of age. Returns
    /// the number removed.
    pub fn remove_expired(&self, max_age_seconds: u64) -> usize {
        self.remove_expired_at(max_age_seconds, unix_now())
    }

    /// [`AlertStore::remove_expired`] against an explicit clock reading.
    pub fn remove_expired_at(&self, max_age_seconds: u64, now: u64) -> usize {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let before = map.len();
        map.retain(|_, alert| {
            !(alert.is_acknowledged() && alert.age_seconds(now) > max_age_seconds)
        });
        before - map.len()
    }

    pub fn clear(&self) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComponentRef, LocationInfo};

    fn board_alert(uuid: &str, address: &str) -> Alert {
        let location = LocationInfo {
            board_address: address.to_string(),
            ..Default::default()
        };
        Alert::board(uuid, location, &["fault".to_string()])
    }

    fn component_alert(uuid: &str, pipeline_uuid: &str, task_id: &str) -> Alert {
        let component = ComponentRef {
            pipeline_uuid: pipeline_uuid.to_string(),
            task_id: task_id.to_string(),
            ..Default::default()
        };
        Alert::component(uuid, component, LocationInfo::default(), &[])
    }

    /// Save an alert with a forced timestamp, for TTL tests.
    fn save_at(store: &AlertStore, mut alert: Alert, timestamp: u64) {
        alert.set_timestamp(timestamp);
        store.save(alert);
    }

    #[test]
    fn test_save_and_lookup() {
        let store = AlertStore::new();
        store.save(board_alert("alert-1", "192.168.1.103"));

        assert_eq!(store.count_active(), 1);
        assert_eq!(store.count_unacknowledged(), 1);
        let alert = store.find_by_uuid("alert-1").unwrap();
        assert_eq!(alert.related_entity(), "192.168.1.103");
        assert!(store.find_by_uuid("alert-2").is_none());
    }

    #[test]
    fn test_kind_and_entity_queries() {
        let store = AlertStore::new();
        store.save(board_alert("alert-1", "192.168.1.103"));
        store.save(component_alert("alert-2", "stack-1", "task-7"));
        store.save(component_alert("alert-3", "stack-2", "task-8"));

        assert_eq!(store.count_board_alerts(), 1);
        assert_eq!(store.count_component_alerts(), 2);
        assert_eq!(store.find_by_kind(AlertKind::Component).len(), 2);
        assert_eq!(store.find_by_entity("task-7").len(), 1);
        assert_eq!(store.find_by_board_address("192.168.1.103").len(), 1);
        assert!(store.find_by_board_address("192.168.1.104").is_empty());
        assert_eq!(store.find_by_pipeline_uuid("stack-2").len(), 1);
    }

    #[test]
    fn test_acknowledge() {
        let store = AlertStore::new();
        store.save(board_alert("alert-1", "192.168.1.103"));

        assert!(store.acknowledge("alert-1"));
        assert_eq!(store.count_unacknowledged(), 0);
        assert!(store.get_unacknowledged().is_empty());
        assert_eq!(store.count_active(), 1);

        // Re-acknowledging is a successful no-op.
        assert!(store.acknowledge("alert-1"));
        assert!(!store.acknowledge("missing"));
    }

    #[test]
    fn test_acknowledge_many_counts_hits() {
        let store = AlertStore::new();
        store.save(board_alert("alert-1", "a"));
        store.save(board_alert("alert-2", "b"));

        let uuids = vec![
            "alert-1".to_string(),
            "alert-2".to_string(),
            "missing".to_string(),
        ];
        assert_eq!(store.acknowledge_many(&uuids), 2);
        assert_eq!(store.count_unacknowledged(), 0);
    }

    #[test]
    fn test_ttl_expiry_only_removes_old_acknowledged() {
        let store = AlertStore::new();
        save_at(&store, board_alert("alert-1", "a"), 0);
        store.acknowledge("alert-1");

        // Young enough to survive.
        assert_eq!(store.remove_expired_at(100, 50), 0);
        assert_eq!(store.count_active(), 1);

        // Now past the TTL.
        assert_eq!(store.remove_expired_at(100, 200), 1);
        assert_eq!(store.count_active(), 0);
    }

    #[test]
    fn test_ttl_never_touches_unacknowledged() {
        let store = AlertStore::new();
        save_at(&store, board_alert("alert-1", "a"), 0);

        assert_eq!(store.remove_expired_at(10, 1_000_000), 0);
        assert_eq!(store.count_active(), 1);
    }

    #[test]
    fn test_ttl_on_empty_store() {
        let store = AlertStore::new();
        assert_eq!(store.remove_expired_at(10, 1_000), 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = AlertStore::new();
        store.save(board_alert("alert-1", "a"));

        assert!(store.remove("alert-1"));
        assert!(!store.remove("alert-1"));

        store.save(board_alert("alert-2", "b"));
        store.clear();
        assert_eq!(store.count_active(), 0);
    }

    #[test]
    fn test_active_alerts_ordered_by_timestamp() {
        let store = AlertStore::new();
        save_at(&store, board_alert("alert-b", "x"), 200);
        save_at(&store, board_alert("alert-a", "y"), 100);

        let all = store.get_all_active();
        assert_eq!(all[0].uuid(), "alert-a");
        assert_eq!(all[1].uuid(), "alert-b");
    }
}
