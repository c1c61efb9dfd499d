//! Daemon wiring: build the component graph and run it.
//!
//! [`Daemon::new`] materialises the topology, initialises the stores and
//! constructs the services; [`Daemon::start`] binds the sockets and spawns
//! the background tasks (collector, broadcaster, command listener, webhook
//! server, alert sweeper) under one cancellation token. Shutting down
//! cancels the token and joins every task.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alerts::AlertService;
use crate::backend::{BackendError, HttpBackendClient};
use crate::collector::Collector;
use crate::config::Config;
use crate::control::ControlService;
use crate::net::{Broadcaster, BroadcasterConfig, CommandListener, ListenerConfig};
use crate::query::QueryService;
use crate::store::{AlertStore, ChassisStore, PipelineStore};
use crate::topology::build_topology;
use crate::webhook;

/// How often the alert sweeper runs.
const ALERT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Age past which an acknowledged alert is dropped.
const ALERT_TTL_SECONDS: u64 = 86_400;

/// Startup failures. Anything here is fatal; runtime errors are absorbed
/// by the individual components.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),

    #[error("broadcast socket: {0}")]
    Broadcast(std::io::Error),

    #[error("command listener socket: {0}")]
    Listener(std::io::Error),

    #[error("webhook listener: {0}")]
    Webhook(std::io::Error),
}

/// The assembled component graph, ready to start.
pub struct Daemon {
    config: Config,
    chassis: Arc<ChassisStore>,
    pipelines: Arc<PipelineStore>,
    alert_store: Arc<AlertStore>,
    backend: Arc<HttpBackendClient>,
    query: QueryService,
    control: Arc<ControlService<HttpBackendClient>>,
    alerts: AlertService,
}

impl Daemon {
    /// Build every component from a (sanitized) configuration.
    pub fn new(config: Config) -> Result<Self, DaemonError> {
        let chassis = Arc::new(ChassisStore::new());
        chassis.initialize(build_topology(&config.hardware));
        let pipelines = Arc::new(PipelineStore::new());
        let alert_store = Arc::new(AlertStore::new());

        let backend = Arc::new(HttpBackendClient::new(
            config.backend.api_url.clone(),
            Duration::from_secs(config.backend.timeout_seconds as u64),
        )?);

        let query = QueryService::new(
            Arc::clone(&chassis),
            Arc::clone(&pipelines),
            Arc::clone(&alert_store),
        );
        let control = Arc::new(ControlService::new(
            Arc::clone(&backend),
            Arc::clone(&pipelines),
        ));
        let alerts = AlertService::new(Arc::clone(&alert_store));

        Ok(Self {
            config,
            chassis,
            pipelines,
            alert_store,
            backend,
            query,
            control,
            alerts,
        })
    }

    /// Read-side facade, for heartbeats and embedding callers.
    pub fn query(&self) -> &QueryService {
        &self.query
    }

    pub fn alerts(&self) -> &AlertService {
        &self.alerts
    }

    pub fn control(&self) -> &Arc<ControlService<HttpBackendClient>> {
        &self.control
    }

    /// Bind the sockets and spawn all background tasks.
    pub async fn start(self, shutdown: CancellationToken) -> Result<DaemonHandle, DaemonError> {
        let group: Ipv4Addr = self
            .config
            .udp
            .multicast_address
            .parse()
            .unwrap_or(Ipv4Addr::new(239, 255, 0, 1));

        info!(
            backend = %self.backend.base_url(),
            group = %group,
            broadcast_port = self.config.udp.state_broadcast_port,
            command_port = self.config.udp.command_listener_port,
            webhook_port = self.config.webhook.listen_port,
            "Starting fleetmon daemon"
        );

        let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        // Collector: the single writer of the chassis and pipeline stores.
        let collector = Collector::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.chassis),
            Arc::clone(&self.pipelines),
            Duration::from_secs(self.config.data_collector.interval_seconds as u64),
        );
        tasks.push((
            "collector",
            tokio::spawn(collector.run(shutdown.clone())),
        ));

        // Broadcaster: board status, alerts and labels to the group.
        let base = self.config.udp.broadcast_interval_ms as u64;
        let broadcaster = Broadcaster::bind(
            BroadcasterConfig {
                group,
                port: self.config.udp.state_broadcast_port,
                board_interval: Duration::from_millis(base),
                alert_interval: Duration::from_millis(base * 2),
                label_interval: Duration::from_millis(base * 5),
            },
            Arc::clone(&self.chassis),
            Arc::clone(&self.pipelines),
            Arc::clone(&self.alert_store),
        )
        .await
        .map_err(DaemonError::Broadcast)?;
        tasks.push((
            "broadcaster",
            tokio::spawn(broadcaster.run(shutdown.clone())),
        ));

        // Command listener: deploy/undeploy/acknowledge from the group.
        let listener = CommandListener::bind(
            ListenerConfig {
                group,
                command_port: self.config.udp.command_listener_port,
                response_port: self.config.udp.state_broadcast_port,
            },
            Arc::clone(&self.control),
            self.alerts.clone(),
        )
        .map_err(DaemonError::Listener)?;
        tasks.push(("listener", tokio::spawn(listener.run(shutdown.clone()))));

        // Webhook endpoint.
        let webhook_listener = webhook::bind(self.config.webhook.listen_port)
            .await
            .map_err(DaemonError::Webhook)?;
        let webhook_alerts = self.alerts.clone();
        let webhook_shutdown = shutdown.clone();
        tasks.push((
            "webhook",
            tokio::spawn(async move {
                if let Err(e) = webhook::serve(webhook_listener, webhook_alerts, webhook_shutdown).await
                {
                    warn!(error = %e, "Webhook server exited with error");
                }
            }),
        ));

        // Alert sweeper: drop acknowledged alerts past their TTL.
        let sweeper_alerts = self.alerts.clone();
        let sweeper_shutdown = shutdown.clone();
        tasks.push((
            "alert-sweeper",
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(ALERT_SWEEP_INTERVAL);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                // The immediate first tick would sweep an empty store.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        biased;
                        _ = sweeper_shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            sweeper_alerts.cleanup_expired(ALERT_TTL_SECONDS);
                        }
                    }
                }
            }),
        ));

        Ok(DaemonHandle {
            shutdown,
            tasks,
            query: self.query,
        })
    }
}

/// Handle over the running task set.
pub struct DaemonHandle {
    shutdown: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    query: QueryService,
}

impl DaemonHandle {
    /// Read-side facade of the running daemon.
    pub fn query(&self) -> &QueryService {
        &self.query
    }

    /// Cancel everything and wait for each task to finish.
    pub async fn shutdown(self) {
        info!("Shutting down daemon");
        self.shutdown.cancel();
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                warn!(task = name, error = %e, "Task join failed");
            }
        }
        info!("Daemon stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UdpSettings;

    /// Config bound to ephemeral/high ports so tests can run in parallel.
    fn test_config() -> Config {
        Config {
            udp: UdpSettings {
                state_broadcast_port: 39001,
                command_listener_port: 39002,
                ..Default::default()
            },
            webhook: crate::config::WebhookSettings { listen_port: 0 },
            ..Default::default()
        }
        // Deliberately not sanitized: port 0 lets the OS pick.
    }

    #[tokio::test]
    async fn test_daemon_builds_topology() {
        let daemon = Daemon::new(test_config()).unwrap();
        let overview = daemon.query().system_overview().data.unwrap();
        assert_eq!(overview.total_boards, 126);
        assert_eq!(overview.total_chassis, 9);
    }

    #[tokio::test]
    async fn test_daemon_start_and_shutdown() {
        let daemon = Daemon::new(test_config()).unwrap();
        let shutdown = CancellationToken::new();
        let handle = daemon.start(shutdown.clone()).await.unwrap();

        // All five background tasks are live.
        assert_eq!(handle.tasks.len(), 5);

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("shutdown must complete promptly");
    }
}
