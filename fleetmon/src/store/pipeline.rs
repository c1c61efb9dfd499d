//! Pipeline store: shared/exclusive map keyed by pipeline UUID.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{Pipeline, ResourceUsage};

/// Many-reader / single-writer map of the pipeline population.
///
/// Readers take the shared lock and copy out; writers take the exclusive
/// lock. [`PipelineStore::save_all`] holds the exclusive lock across the
/// whole batch so readers observe a batch either before or after, never
/// half-applied. Note it merges rather than replaces: pipelines absent
/// from a batch persist in the store.
#[derive(Debug, Default)]
pub struct PipelineStore {
    inner: RwLock<HashMap<String, Pipeline>>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one pipeline by UUID.
    pub fn save(&self, pipeline: Pipeline) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(pipeline.uuid.clone(), pipeline);
    }

    /// Upsert a batch under one exclusive lock.
    ///
    /// Merge semantics: entries not present in `pipelines` are left alone.
    pub fn save_all(&self, pipelines: Vec<Pipeline>) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        for pipeline in pipelines {
            map.insert(pipeline.uuid.clone(), pipeline);
        }
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<Pipeline> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(uuid).cloned()
    }

    /// Copies of all pipelines, ordered by UUID for stable output.
    pub fn get_all(&self) -> Vec<Pipeline> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Pipeline> = map.values().cloned().collect();
        all.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        all
    }

    /// Pipelines carrying the given label UUID.
    pub fn find_by_label(&self, label_uuid: &str) -> Vec<Pipeline> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<Pipeline> = map
            .values()
            .filter(|p| p.has_label(label_uuid))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        found
    }

    /// Resource usage of the first task matching `task_id`.
    ///
    /// Linear scan over pipelines, then services, then tasks; at this
    /// system's scale (at most ~720 tasks) the scan is negligible.
    pub fn find_task_resources(&self, task_id: &str) -> Option<ResourceUsage> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().find_map(|p| p.task_resources(task_id))
    }

    /// The pipeline owning the task with the given id.
    pub fn find_pipeline_by_task_id(&self, task_id: &str) -> Option<Pipeline> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().find(|p| p.find_task(task_id).is_some()).cloned()
    }

    pub fn count(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    pub fn count_deployed(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|p| p.is_deployed()).count()
    }

    pub fn count_running_normally(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|p| p.is_running_normally()).count()
    }

    pub fn count_abnormal(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.values().filter(|p| !p.is_running_normally()).count()
    }

    /// Remove a pipeline; returns whether it existed.
    pub fn remove(&self, uuid: &str) -> bool {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(uuid).is_some()
    }

    pub fn clear(&self) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DeployStatus, PipelineLabel, Service, ServiceStatus, TaskDetail,
    };

    fn pipeline_with_label(uuid: &str, label_uuid: &str) -> Pipeline {
        let mut pipeline = Pipeline::new(uuid, format!("pipeline-{uuid}"));
        pipeline.add_label(PipelineLabel {
            name: format!("label for {uuid}"),
            uuid: label_uuid.to_string(),
        });
        pipeline
    }

    fn pipeline_with_task(uuid: &str, task_id: &str, cpu_cores: f32) -> Pipeline {
        let mut service = Service::new(format!("svc-{uuid}"), "svc");
        service.status = ServiceStatus::Running;
        let mut task = TaskDetail::new(task_id);
        task.resources.cpu_cores = cpu_cores;
        service.upsert_task(task);

        let mut pipeline = Pipeline::new(uuid, format!("pipeline-{uuid}"));
        pipeline.upsert_service(service);
        pipeline
    }

    #[test]
    fn test_save_upserts_by_uuid() {
        let store = PipelineStore::new();
        store.save(Pipeline::new("stack-1", "first"));
        store.save(Pipeline::new("stack-1", "renamed"));

        assert_eq!(store.count(), 1);
        assert_eq!(store.find_by_uuid("stack-1").unwrap().name, "renamed");
        assert!(store.find_by_uuid("stack-2").is_none());
    }

    #[test]
    fn test_save_all_merges() {
        let store = PipelineStore::new();
        store.save(Pipeline::new("stack-1", "one"));
        store.save_all(vec![
            Pipeline::new("stack-2", "two"),
            Pipeline::new("stack-3", "three"),
        ]);

        // stack-1 was absent from the batch but persists.
        assert_eq!(store.count(), 3);
        assert!(store.find_by_uuid("stack-1").is_some());
    }

    #[test]
    fn test_find_by_label() {
        let store = PipelineStore::new();
        store.save(pipeline_with_label("stack-1", "label-a"));
        store.save(pipeline_with_label("stack-2", "label-a"));
        store.save(pipeline_with_label("stack-3", "label-b"));

        let found = store.find_by_label("label-a");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].uuid, "stack-1");
        assert!(store.find_by_label("label-x").is_empty());
    }

    #[test]
    fn test_task_resource_lookup() {
        let store = PipelineStore::new();
        store.save(pipeline_with_task("stack-1", "task-a", 2.0));
        store.save(pipeline_with_task("stack-2", "task-b", 4.0));

        let resources = store.find_task_resources("task-b").unwrap();
        assert!((resources.cpu_cores - 4.0).abs() < f32::EPSILON);
        assert!(store.find_task_resources("task-x").is_none());

        let owner = store.find_pipeline_by_task_id("task-a").unwrap();
        assert_eq!(owner.uuid, "stack-1");
        assert!(store.find_pipeline_by_task_id("task-x").is_none());
    }

    #[test]
    fn test_counters() {
        let store = PipelineStore::new();

        let mut deployed = Pipeline::new("stack-1", "one");
        deployed.deploy_status = DeployStatus::Deployed;
        store.save(deployed);

        let mut abnormal = Pipeline::new("stack-2", "two");
        let mut bad = Service::new("svc-bad", "bad");
        bad.status = ServiceStatus::Abnormal;
        abnormal.upsert_service(bad);
        store.save(abnormal);

        assert_eq!(store.count(), 2);
        assert_eq!(store.count_deployed(), 1);
        assert_eq!(store.count_running_normally(), 1);
        assert_eq!(store.count_abnormal(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = PipelineStore::new();
        store.save(Pipeline::new("stack-1", "one"));

        assert!(store.remove("stack-1"));
        assert!(!store.remove("stack-1"));

        store.save(Pipeline::new("stack-2", "two"));
        store.clear();
        assert_eq!(store.count(), 0);
    }
}
