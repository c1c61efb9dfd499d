//! In-memory stores for the fleet snapshot, pipelines and alerts.
//!
//! Each store exclusively owns its entities and hands out either owned
//! copies or frozen [`std::sync::Arc`] snapshots; no caller ever holds a
//! reference into store internals.
//!
//! Concurrency disciplines differ per store:
//!
//! - [`ChassisStore`]: wait-free readers over an atomically swapped
//!   snapshot, one writer (the collector).
//! - [`PipelineStore`] / [`AlertStore`]: shared/exclusive lock over a map;
//!   batch writes hold the exclusive lock for the whole batch.

mod alert;
mod chassis;
mod pipeline;

pub use alert::AlertStore;
pub use chassis::ChassisStore;
pub use pipeline::PipelineStore;
