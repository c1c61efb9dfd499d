//! Configuration: JSON file with per-field fallback to defaults.
//!
//! A missing file, a malformed file, or an out-of-range field never stops
//! the daemon: the loader logs a diagnostic and continues with the default
//! for whatever was wrong. Field names in the file are snake_case under the
//! section keys shown on each struct.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default backend HTTP timeout in seconds.
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u32 = 10;

/// Default collector period in seconds.
pub const DEFAULT_COLLECT_INTERVAL_SECS: u32 = 10;

/// Default multicast group.
pub const DEFAULT_MULTICAST_ADDRESS: &str = "239.255.0.1";

/// Default broadcast port.
pub const DEFAULT_STATE_BROADCAST_PORT: u16 = 9001;

/// Default command port.
pub const DEFAULT_COMMAND_LISTENER_PORT: u16 = 9002;

/// Default board-status broadcast period in milliseconds.
pub const DEFAULT_BROADCAST_INTERVAL_MS: u32 = 1000;

/// Default webhook listen port.
pub const DEFAULT_WEBHOOK_PORT: u16 = 9000;

/// Backend HTTP client settings (`backend`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub api_url: String,
    pub timeout_seconds: u32,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_BACKEND_TIMEOUT_SECS,
        }
    }
}

/// Collector settings (`data_collector`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    pub interval_seconds: u32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_COLLECT_INTERVAL_SECS,
        }
    }
}

/// UDP multicast settings (`udp`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UdpSettings {
    pub multicast_address: String,
    pub state_broadcast_port: u16,
    pub command_listener_port: u16,
    pub broadcast_interval_ms: u32,
}

impl Default for UdpSettings {
    fn default() -> Self {
        Self {
            multicast_address: DEFAULT_MULTICAST_ADDRESS.to_string(),
            state_broadcast_port: DEFAULT_STATE_BROADCAST_PORT,
            command_listener_port: DEFAULT_COMMAND_LISTENER_PORT,
            broadcast_interval_ms: DEFAULT_BROADCAST_INTERVAL_MS,
        }
    }
}

/// Webhook server settings (`webhook`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub listen_port: u16,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_WEBHOOK_PORT,
        }
    }
}

/// Topology factory settings (`hardware`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HardwareSettings {
    pub chassis_count: u32,
    pub boards_per_chassis: u32,
    /// Base of every board address; `%d` is the chassis number.
    pub ip_base_pattern: String,
    /// Added to the slot number for the last address octet.
    pub ip_offset: u32,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            chassis_count: crate::domain::CHASSIS_COUNT as u32,
            boards_per_chassis: crate::domain::BOARDS_PER_CHASSIS as u32,
            ip_base_pattern: "192.168.%d".to_string(),
            ip_offset: 100,
        }
    }
}

/// Bounded-collection limits (`limits`).
///
/// These mirror the domain bounds; values other than the defaults are
/// rejected because the wire layouts are sized for them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_tasks_per_board: u32,
    pub max_labels_per_stack: u32,
    pub max_alert_messages: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_tasks_per_board: crate::domain::MAX_TASKS_PER_BOARD as u32,
            max_labels_per_stack: crate::domain::MAX_LABELS_PER_PIPELINE as u32,
            max_alert_messages: crate::domain::MAX_ALERT_MESSAGES as u32,
        }
    }
}

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSettings,
    pub data_collector: CollectorSettings,
    pub udp: UdpSettings,
    pub webhook: WebhookSettings,
    pub hardware: HardwareSettings,
    pub limits: LimitSettings,
}

impl Config {
    /// Load from a JSON file, falling back to defaults.
    ///
    /// A missing or unparseable file yields the full default config; an
    /// invalid individual field is reset to its default by
    /// [`Config::sanitized`]. Either way the daemon starts.
    pub fn load(path: impl AsRef<Path>) -> Config {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Config>(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Config file malformed, using defaults");
                    Config::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
                Config::default()
            }
        };
        config.sanitized()
    }

    /// Replace out-of-range fields with their defaults, with a diagnostic
    /// per offending field.
    pub fn sanitized(mut self) -> Config {
        if self.backend.timeout_seconds == 0 {
            warn!("backend.timeout_seconds must be positive, using default");
            self.backend.timeout_seconds = DEFAULT_BACKEND_TIMEOUT_SECS;
        }
        if self.data_collector.interval_seconds == 0 {
            warn!("data_collector.interval_seconds must be positive, using default");
            self.data_collector.interval_seconds = DEFAULT_COLLECT_INTERVAL_SECS;
        }
        if self.udp.multicast_address.parse::<std::net::Ipv4Addr>().is_err() {
            warn!(
                address = %self.udp.multicast_address,
                "udp.multicast_address is not an IPv4 address, using default"
            );
            self.udp.multicast_address = DEFAULT_MULTICAST_ADDRESS.to_string();
        }
        if self.udp.state_broadcast_port < 1024 {
            warn!(
                port = self.udp.state_broadcast_port,
                "udp.state_broadcast_port out of range, using default"
            );
            self.udp.state_broadcast_port = DEFAULT_STATE_BROADCAST_PORT;
        }
        if self.udp.command_listener_port < 1024 {
            warn!(
                port = self.udp.command_listener_port,
                "udp.command_listener_port out of range, using default"
            );
            self.udp.command_listener_port = DEFAULT_COMMAND_LISTENER_PORT;
        }
        if self.udp.broadcast_interval_ms < 100 {
            warn!(
                interval_ms = self.udp.broadcast_interval_ms,
                "udp.broadcast_interval_ms below 100ms, using default"
            );
            self.udp.broadcast_interval_ms = DEFAULT_BROADCAST_INTERVAL_MS;
        }
        if self.webhook.listen_port < 1024 {
            warn!(
                port = self.webhook.listen_port,
                "webhook.listen_port out of range, using default"
            );
            self.webhook.listen_port = DEFAULT_WEBHOOK_PORT;
        }

        let hardware_defaults = HardwareSettings::default();
        if self.hardware.chassis_count == 0
            || self.hardware.chassis_count > crate::domain::CHASSIS_COUNT as u32
        {
            warn!(
                count = self.hardware.chassis_count,
                "hardware.chassis_count out of range, using default"
            );
            self.hardware.chassis_count = hardware_defaults.chassis_count;
        }
        if self.hardware.boards_per_chassis != hardware_defaults.boards_per_chassis {
            warn!(
                count = self.hardware.boards_per_chassis,
                "hardware.boards_per_chassis is fixed by the slot layout, using default"
            );
            self.hardware.boards_per_chassis = hardware_defaults.boards_per_chassis;
        }

        let limit_defaults = LimitSettings::default();
        if self.limits.max_tasks_per_board != limit_defaults.max_tasks_per_board
            || self.limits.max_labels_per_stack != limit_defaults.max_labels_per_stack
            || self.limits.max_alert_messages != limit_defaults.max_alert_messages
        {
            warn!("limits are fixed by the wire layout, using defaults");
            self.limits = limit_defaults;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.api_url, "http://localhost:8080");
        assert_eq!(config.backend.timeout_seconds, 10);
        assert_eq!(config.data_collector.interval_seconds, 10);
        assert_eq!(config.udp.multicast_address, "239.255.0.1");
        assert_eq!(config.udp.state_broadcast_port, 9001);
        assert_eq!(config.udp.command_listener_port, 9002);
        assert_eq!(config.webhook.listen_port, 9000);
        assert_eq!(config.hardware.chassis_count, 9);
        assert_eq!(config.limits.max_tasks_per_board, 8);
    }

    #[test]
    fn test_parse_partial_file() {
        let json = r#"{
            "backend": {"api_url": "http://10.0.0.5:8080"},
            "udp": {"state_broadcast_port": 19001}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let config = config.sanitized();

        assert_eq!(config.backend.api_url, "http://10.0.0.5:8080");
        // Unset fields keep their defaults.
        assert_eq!(config.backend.timeout_seconds, 10);
        assert_eq!(config.udp.state_broadcast_port, 19001);
        assert_eq!(config.udp.command_listener_port, 9002);
    }

    #[test]
    fn test_sanitize_resets_offending_fields_only() {
        let json = r#"{
            "backend": {"api_url": "http://10.0.0.5:8080", "timeout_seconds": 0},
            "udp": {"state_broadcast_port": 80, "broadcast_interval_ms": 5},
            "hardware": {"chassis_count": 40}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let config = config.sanitized();

        // Offending fields fall back...
        assert_eq!(config.backend.timeout_seconds, 10);
        assert_eq!(config.udp.state_broadcast_port, 9001);
        assert_eq!(config.udp.broadcast_interval_ms, 1000);
        assert_eq!(config.hardware.chassis_count, 9);
        // ...valid ones survive.
        assert_eq!(config.backend.api_url, "http://10.0.0.5:8080");
    }

    #[test]
    fn test_sanitize_rejects_bad_multicast_address() {
        let config = Config {
            udp: UdpSettings {
                multicast_address: "not-an-address".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = config.sanitized();
        assert_eq!(config.udp.multicast_address, "239.255.0.1");
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load("/nonexistent/fleetmon.json");
        assert_eq!(config.backend.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_limits_are_pinned() {
        let config = Config {
            limits: LimitSettings {
                max_tasks_per_board: 99,
                ..Default::default()
            },
            ..Default::default()
        };
        let config = config.sanitized();
        assert_eq!(config.limits.max_tasks_per_board, 8);
    }
}
