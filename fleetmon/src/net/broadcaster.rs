//! Multicast state broadcaster: three independent emission schedules.
//!
//! One task, one sending socket, three tickers:
//!
//! | stream | default period | packet |
//! |---|---|---|
//! | board status | 1 s | 1000-byte resource-monitor response |
//! | alerts | 2 s | alert batches, ≤ 32 records each |
//! | pipeline labels | 5 s | label batches, ≤ 64 records each |
//!
//! Emission is serialised on the task; packets are small and the fan-out is
//! passive multicast, so nothing here needs to be concurrent. Send errors
//! are logged and dropped; the next tick retries anyway.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{
    encode_alert_record, encode_label_record, PacketHeader, PacketType, ResourceMonitorPacket,
    ALERT_RECORD_LEN, HEADER_LEN, LABEL_RECORD_LEN, MAX_ALERTS_PER_PACKET, MAX_PACKET_BYTES,
    MAX_PIPELINES_PER_PACKET,
};
use crate::domain::{unix_now_ms, Alert, Pipeline};
use crate::store::{AlertStore, ChassisStore, PipelineStore};

/// Multicast TTL for outgoing packets.
const MULTICAST_TTL: u32 = 64;

/// Pacing and addressing of the broadcast streams.
#[derive(Debug, Clone)]
pub struct BroadcasterConfig {
    /// Multicast group address.
    pub group: Ipv4Addr,
    /// Destination port for all broadcast streams.
    pub port: u16,
    pub board_interval: Duration,
    pub alert_interval: Duration,
    pub label_interval: Duration,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 255, 0, 1),
            port: 9001,
            board_interval: Duration::from_millis(1000),
            alert_interval: Duration::from_millis(2000),
            label_interval: Duration::from_millis(5000),
        }
    }
}

/// The broadcaster task. Reads the stores, writes the multicast group.
pub struct Broadcaster {
    socket: UdpSocket,
    target: SocketAddr,
    config: BroadcasterConfig,
    chassis: Arc<ChassisStore>,
    pipelines: Arc<PipelineStore>,
    alerts: Arc<AlertStore>,
    /// Sequence for headered packets (alert and label streams).
    sequence: u32,
    /// Response-id counter of the board-status packet; wraps at `u32::MAX`.
    response_id: u32,
}

impl Broadcaster {
    /// Bind the sending socket and set the multicast TTL.
    pub async fn bind(
        config: BroadcasterConfig,
        chassis: Arc<ChassisStore>,
        pipelines: Arc<PipelineStore>,
        alerts: Arc<AlertStore>,
    ) -> std::io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
        let target = SocketAddr::from((config.group, config.port));

        Ok(Self {
            socket,
            target,
            config,
            chassis,
            pipelines,
            alerts,
            sequence: 0,
            response_id: 0,
        })
    }

    /// Run the three emission schedules until cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            target = %self.target,
            board_ms = self.config.board_interval.as_millis() as u64,
            alert_ms = self.config.alert_interval.as_millis() as u64,
            label_ms = self.config.label_interval.as_millis() as u64,
            "Broadcaster starting"
        );

        let mut board_ticker = tokio::time::interval(self.config.board_interval);
        let mut alert_ticker = tokio::time::interval(self.config.alert_interval);
        let mut label_ticker = tokio::time::interval(self.config.label_interval);
        for ticker in [&mut board_ticker, &mut alert_ticker, &mut label_ticker] {
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Broadcaster shutting down");
                    break;
                }

                _ = board_ticker.tick() => {
                    let packet = self.build_board_packet();
                    self.send(&packet).await;
                }

                _ = alert_ticker.tick() => {
                    let alerts = self.alerts.get_unacknowledged();
                    for packet in self.build_alert_packets(&alerts) {
                        self.send(&packet).await;
                    }
                }

                _ = label_ticker.tick() => {
                    let pipelines = self.pipelines.get_all();
                    for packet in self.build_label_packets(&pipelines) {
                        self.send(&packet).await;
                    }
                }
            }
        }
    }

    /// Board-status stream: one fixed 1000-byte packet for the whole fleet.
    fn build_board_packet(&mut self) -> Vec<u8> {
        let snapshot = self.chassis.snapshot();
        let packet = ResourceMonitorPacket::from_grid(&snapshot, self.response_id);
        self.response_id = self.response_id.wrapping_add(1);
        packet.encode().to_vec()
    }

    /// Alert stream: unacknowledged alerts, chunked. Empty input emits
    /// nothing for the tick.
    fn build_alert_packets(&mut self, alerts: &[Alert]) -> Vec<Vec<u8>> {
        self.build_batches(
            alerts,
            PacketType::Alert,
            MAX_ALERTS_PER_PACKET,
            ALERT_RECORD_LEN,
            encode_alert_record,
        )
    }

    /// Label stream: every pipeline's identity, status and labels, chunked.
    fn build_label_packets(&mut self, pipelines: &[Pipeline]) -> Vec<Vec<u8>> {
        self.build_batches(
            pipelines,
            PacketType::Label,
            MAX_PIPELINES_PER_PACKET,
            LABEL_RECORD_LEN,
            encode_label_record,
        )
    }

    /// Chunk `items` into headered batch packets.
    ///
    /// A batch closes when it reaches `max_records` or the next record
    /// would push the packet past [`MAX_PACKET_BYTES`]. Body layout:
    /// record count u32, then the records.
    fn build_batches<T>(
        &mut self,
        items: &[T],
        packet_type: PacketType,
        max_records: usize,
        record_len: usize,
        encode_record: fn(&mut Vec<u8>, &T),
    ) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        let per_packet = max_records.min((MAX_PACKET_BYTES - HEADER_LEN - 4) / record_len);

        for chunk in items.chunks(per_packet.max(1)) {
            let mut body = Vec::with_capacity(4 + chunk.len() * record_len);
            body.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
            for item in chunk {
                encode_record(&mut body, item);
            }

            let mut packet = Vec::with_capacity(HEADER_LEN + body.len());
            PacketHeader::new(packet_type, self.sequence, unix_now_ms(), body.len() as u32)
                .encode_into(&mut packet);
            self.sequence = self.sequence.wrapping_add(1);
            packet.extend_from_slice(&body);
            packets.push(packet);
        }

        packets
    }

    async fn send(&self, packet: &[u8]) {
        if let Err(e) = self.socket.send_to(packet, self.target).await {
            warn!(error = %e, len = packet.len(), "Broadcast send failed");
        } else {
            debug!(len = packet.len(), "Broadcast packet sent");
        }
    }
}
