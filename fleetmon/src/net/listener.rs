//! Multicast command listener: deploy, undeploy, acknowledge-alert.
//!
//! Joins the multicast group on the command port (with `SO_REUSEADDR`, so
//! co-located listeners can share it), decodes inbound command packets and
//! dispatches them to the control and alert services. Responses go back to
//! the multicast group on the broadcast port, not unicast to the sender:
//! every UI peer sees every outcome and correlates by `command_id`.
//!
//! Duplicate command ids are tolerated: each datagram is processed and
//! answered independently.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{
    AckAlertCommand, CommandResponse, CommandResult, LabelCommand, PacketHeader, PacketType,
    COMMAND_BODY_LEN, HEADER_LEN,
};
use crate::alerts::AlertService;
use crate::backend::BackendClient;
use crate::control::ControlService;
use crate::domain::unix_now_ms;
use crate::dto::{ResponseCode, ServiceResponse};

/// Largest datagram the listener accepts.
const MAX_DATAGRAM: usize = 2048;

/// Addressing of the command listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Multicast group to join.
    pub group: Ipv4Addr,
    /// Port commands arrive on.
    pub command_port: u16,
    /// Port responses are multicast to.
    pub response_port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            group: Ipv4Addr::new(239, 255, 0, 1),
            command_port: 9002,
            response_port: 9001,
        }
    }
}

/// The command listener task.
pub struct CommandListener<C> {
    socket: UdpSocket,
    respond: UdpSocket,
    response_target: SocketAddr,
    control: Arc<ControlService<C>>,
    alerts: AlertService,
    sequence: u32,
}

impl<C: BackendClient> CommandListener<C> {
    /// Bind both sockets and join the multicast group.
    pub fn bind(
        config: ListenerConfig,
        control: Arc<ControlService<C>>,
        alerts: AlertService,
    ) -> std::io::Result<Self> {
        let socket = bind_multicast(config.command_port, config.group)?;
        let respond = std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        respond.set_nonblocking(true)?;
        let respond = UdpSocket::from_std(respond)?;

        Ok(Self {
            socket,
            respond,
            response_target: SocketAddr::from((config.group, config.response_port)),
            control,
            alerts,
            sequence: 0,
        })
    }

    /// Receive and dispatch datagrams until cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            local = ?self.socket.local_addr().ok(),
            responses = %self.response_target,
            "Command listener starting"
        );

        let mut buffer = [0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Command listener shutting down");
                    break;
                }

                received = self.socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((len, sender)) => {
                            self.process_datagram(&buffer[..len], sender).await;
                        }
                        Err(e) => {
                            warn!(error = %e, "Command receive error");
                        }
                    }
                }
            }
        }
    }

    async fn process_datagram(&mut self, data: &[u8], sender: SocketAddr) {
        let Some(header) = PacketHeader::decode(data) else {
            debug!(%sender, len = data.len(), "Dropping short datagram");
            return;
        };

        let body = &data[HEADER_LEN..];
        match PacketType::from_u16(header.packet_type) {
            Some(packet_type @ (PacketType::Deploy | PacketType::Undeploy)) => {
                if body.len() < COMMAND_BODY_LEN {
                    debug!(%sender, "Dropping truncated label command");
                    return;
                }
                if let Some(command) = LabelCommand::decode(body) {
                    self.handle_label_command(packet_type, command).await;
                }
            }
            Some(PacketType::AckAlert) => {
                if body.len() < COMMAND_BODY_LEN {
                    debug!(%sender, "Dropping truncated ack command");
                    return;
                }
                if let Some(command) = AckAlertCommand::decode(body) {
                    self.handle_ack_command(command).await;
                }
            }
            other => {
                debug!(%sender, packet_type = header.packet_type, ?other, "Dropping unknown packet");
            }
        }
    }

    async fn handle_label_command(&mut self, packet_type: PacketType, command: LabelCommand) {
        info!(
            command_id = command.command_id,
            label = %command.label_uuid,
            operator = %command.operator_id,
            deploy = packet_type == PacketType::Deploy,
            "Label command received"
        );

        let response = if packet_type == PacketType::Deploy {
            self.control.deploy_by_label(&command.label_uuid).await
        } else {
            self.control.undeploy_by_label(&command.label_uuid).await
        };

        self.respond(command.command_id, packet_type, &response).await;
    }

    async fn handle_ack_command(&mut self, command: AckAlertCommand) {
        info!(
            command_id = command.command_id,
            alert = %command.alert_uuid,
            operator = %command.operator_id,
            "Acknowledge command received"
        );

        let response = self.alerts.acknowledge(&command.alert_uuid);
        self.respond(command.command_id, PacketType::AckAlert, &response)
            .await;
    }

    async fn respond<T>(
        &mut self,
        command_id: u64,
        original_type: PacketType,
        outcome: &ServiceResponse<T>,
    ) {
        let result = map_result(outcome);
        let packet = CommandResponse::new(command_id, original_type, result, &*outcome.message)
            .encode(self.sequence, unix_now_ms());
        self.sequence = self.sequence.wrapping_add(1);

        if let Err(e) = self.respond.send_to(&packet, self.response_target).await {
            warn!(error = %e, command_id, "Response send failed");
        }
    }
}

/// Service outcome to wire result code.
fn map_result<T>(response: &ServiceResponse<T>) -> CommandResult {
    if response.success {
        return CommandResult::Success;
    }
    match response.code {
        ResponseCode::InvalidArgument => CommandResult::InvalidParameter,
        ResponseCode::NotFound => CommandResult::NotFound,
        ResponseCode::Transient => CommandResult::Timeout,
        _ => CommandResult::Failed,
    }
}

/// Bind a reusable UDP socket on the port and join the multicast group.
fn bind_multicast(port: u16, group: Ipv4Addr) -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&address.into())?;

    let socket = UdpSocket::from_std(socket.into())?;
    socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
    Ok(socket)
}
