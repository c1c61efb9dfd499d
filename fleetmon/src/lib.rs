//! fleetmon - hardware-fleet monitoring daemon.
//!
//! A stateful aggregator between a southbound backend (the authoritative
//! source of board and pipeline state, reached over HTTP/JSON) and a
//! northbound fleet of UI peers (reached over UDP multicast). It
//! continuously pulls inventory and resource data into an in-memory
//! snapshot, broadcasts binary state packets, executes inbound multicast
//! commands, and ingests alert webhooks.
//!
//! # High-Level API
//!
//! The [`daemon`] module wires everything together:
//!
//! ```ignore
//! use fleetmon::config::Config;
//! use fleetmon::daemon::Daemon;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = Config::load("fleetmon.json");
//! let daemon = Daemon::new(config)?;
//!
//! let shutdown = CancellationToken::new();
//! let handle = daemon.start(shutdown.clone()).await?;
//! // ... until SIGINT ...
//! handle.shutdown().await;
//! ```

pub mod alerts;
pub mod backend;
pub mod collector;
pub mod config;
pub mod control;
pub mod daemon;
pub mod domain;
pub mod dto;
pub mod logging;
pub mod net;
pub mod query;
pub mod store;
pub mod topology;
pub mod webhook;

/// Version of the fleetmon library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
