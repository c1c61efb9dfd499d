//! Multicast wire protocol: packed little-endian layouts.
//!
//! Every command and batch packet starts with the 24-byte header below.
//! Identifier fields are fixed-width NUL-padded ASCII so packets have a
//! stable layout without separate marshalling.
//!
//! ```text
//! Header (24 bytes, little-endian, no padding):
//!   packetType u16 | version u16 | sequence u32 | timestamp_ms u64
//!   | dataLength u32 | reserved[4]
//! ```
//!
//! The board-status stream does not use this header: it is the standalone
//! 1000-byte resource-monitor response ([`ResourceMonitorPacket`]) with its
//! own 22-byte opaque header and response-id counter.

use crate::domain::{Alert, BoardStatus, ChassisGrid, Pipeline};

/// Protocol version stamped into every header.
pub const PROTOCOL_VERSION: u16 = 1;

/// Encoded size of [`PacketHeader`].
pub const HEADER_LEN: usize = 24;

/// Body size of the deploy/undeploy/ack-alert commands:
/// id\[64\] | operatorID\[64\] | commandID u64 | reserved\[16\].
pub const COMMAND_BODY_LEN: usize = 152;

/// Body size of a command response:
/// commandID u64 | type u16 | result u16 | message\[256\] | reserved\[8\].
pub const RESPONSE_BODY_LEN: usize = 276;

/// Free-text limit of a command response message.
pub const RESPONSE_MESSAGE_LEN: usize = 256;

/// Upper bound on any batch packet, header included.
pub const MAX_PACKET_BYTES: usize = 32 * 1024;

/// Alert records per alert-batch packet.
pub const MAX_ALERTS_PER_PACKET: usize = 32;

/// Pipeline records per label-batch packet.
pub const MAX_PIPELINES_PER_PACKET: usize = 64;

/// Encoded size of one alert record.
pub const ALERT_RECORD_LEN: usize = 396;

/// Encoded size of one pipeline label record.
pub const LABEL_RECORD_LEN: usize = 1156;

/// Total size of the resource-monitor response packet.
pub const RESOURCE_MONITOR_PACKET_LEN: usize = 1000;

/// Command code at offset 22 of the resource-monitor packet.
pub const RESOURCE_MONITOR_COMMAND_CODE: u16 = 0xF000;

/// Chassis rows in the resource-monitor packet.
pub const MONITOR_CHASSIS: usize = 9;

/// Board columns per chassis row; slots 13/14 (the power pair) are not
/// represented.
pub const MONITOR_BOARDS: usize = 12;

/// Task cells per board.
pub const MONITOR_TASKS: usize = 8;

/// On-the-wire packet types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PacketType {
    /// Legacy full-chassis state (defined, not emitted).
    ChassisState = 0x0001,
    Alert = 0x0002,
    Label = 0x0003,
    Deploy = 0x1001,
    Undeploy = 0x1002,
    AckAlert = 0x1003,
    CommandResponse = 0x2001,
}

impl PacketType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(PacketType::ChassisState),
            0x0002 => Some(PacketType::Alert),
            0x0003 => Some(PacketType::Label),
            0x1001 => Some(PacketType::Deploy),
            0x1002 => Some(PacketType::Undeploy),
            0x1003 => Some(PacketType::AckAlert),
            0x2001 => Some(PacketType::CommandResponse),
            _ => None,
        }
    }
}

/// Result code of a command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CommandResult {
    Success = 0,
    Failed = 1,
    InvalidParameter = 2,
    NotFound = 3,
    Timeout = 4,
}

/// Common packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub packet_type: u16,
    pub version: u16,
    pub sequence: u32,
    pub timestamp_ms: u64,
    pub data_length: u32,
}

impl PacketHeader {
    pub fn new(packet_type: PacketType, sequence: u32, timestamp_ms: u64, data_length: u32) -> Self {
        Self {
            packet_type: packet_type as u16,
            version: PROTOCOL_VERSION,
            sequence,
            timestamp_ms,
            data_length,
        }
    }

    /// Append the 24-byte encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.packet_type.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp_ms.to_le_bytes());
        buf.extend_from_slice(&self.data_length.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
    }

    /// Parse the header at the start of a datagram.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            packet_type: u16::from_le_bytes([data[0], data[1]]),
            version: u16::from_le_bytes([data[2], data[3]]),
            sequence: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            timestamp_ms: u64::from_le_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ]),
            data_length: u32::from_le_bytes([data[16], data[17], data[18], data[19]]),
        })
    }
}

/// Append `text` as a fixed-width NUL-padded field.
///
/// Oversized values are cut at the field width (identifiers on this wire
/// are ASCII, so the cut never splits a character in practice).
pub fn put_fixed_str(buf: &mut Vec<u8>, text: &str, width: usize) {
    let bytes = text.as_bytes();
    let take = bytes.len().min(width);
    buf.extend_from_slice(&bytes[..take]);
    buf.resize(buf.len() + (width - take), 0);
}

/// Read a fixed-width NUL-padded field back into a string.
pub fn read_fixed_str(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Deploy/undeploy command: operate on every pipeline carrying a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCommand {
    pub label_uuid: String,
    pub operator_id: String,
    pub command_id: u64,
}

impl LabelCommand {
    /// Decode from the body following the header.
    pub fn decode(body: &[u8]) -> Option<Self> {
        let (id, operator_id, command_id) = decode_id_command(body)?;
        Some(Self {
            label_uuid: id,
            operator_id,
            command_id,
        })
    }

    /// Encode a full packet (header + body) for this command.
    pub fn encode(&self, packet_type: PacketType, sequence: u32, timestamp_ms: u64) -> Vec<u8> {
        encode_id_command(
            packet_type,
            sequence,
            timestamp_ms,
            &self.label_uuid,
            &self.operator_id,
            self.command_id,
        )
    }
}

/// Acknowledge-alert command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckAlertCommand {
    pub alert_uuid: String,
    pub operator_id: String,
    pub command_id: u64,
}

impl AckAlertCommand {
    pub fn decode(body: &[u8]) -> Option<Self> {
        let (id, operator_id, command_id) = decode_id_command(body)?;
        Some(Self {
            alert_uuid: id,
            operator_id,
            command_id,
        })
    }

    pub fn encode(&self, sequence: u32, timestamp_ms: u64) -> Vec<u8> {
        encode_id_command(
            PacketType::AckAlert,
            sequence,
            timestamp_ms,
            &self.alert_uuid,
            &self.operator_id,
            self.command_id,
        )
    }
}

/// Shared layout of the three inbound commands.
fn decode_id_command(body: &[u8]) -> Option<(String, String, u64)> {
    if body.len() < COMMAND_BODY_LEN {
        return None;
    }
    let id = read_fixed_str(&body[0..64]);
    let operator_id = read_fixed_str(&body[64..128]);
    let command_id = u64::from_le_bytes(body[128..136].try_into().ok()?);
    Some((id, operator_id, command_id))
}

fn encode_id_command(
    packet_type: PacketType,
    sequence: u32,
    timestamp_ms: u64,
    id: &str,
    operator_id: &str,
    command_id: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + COMMAND_BODY_LEN);
    PacketHeader::new(packet_type, sequence, timestamp_ms, COMMAND_BODY_LEN as u32)
        .encode_into(&mut buf);
    put_fixed_str(&mut buf, id, 64);
    put_fixed_str(&mut buf, operator_id, 64);
    buf.extend_from_slice(&command_id.to_le_bytes());
    buf.extend_from_slice(&[0u8; 16]);
    buf
}

/// Command response, multicast back to the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub command_id: u64,
    pub original_type: u16,
    pub result: CommandResult,
    pub message: String,
}

impl CommandResponse {
    pub fn new(
        command_id: u64,
        original_type: PacketType,
        result: CommandResult,
        message: impl Into<String>,
    ) -> Self {
        Self {
            command_id,
            original_type: original_type as u16,
            result,
            message: message.into(),
        }
    }

    /// Encode a full packet (header + body).
    pub fn encode(&self, sequence: u32, timestamp_ms: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + RESPONSE_BODY_LEN);
        PacketHeader::new(
            PacketType::CommandResponse,
            sequence,
            timestamp_ms,
            RESPONSE_BODY_LEN as u32,
        )
        .encode_into(&mut buf);
        buf.extend_from_slice(&self.command_id.to_le_bytes());
        buf.extend_from_slice(&self.original_type.to_le_bytes());
        buf.extend_from_slice(&(self.result as u16).to_le_bytes());
        put_fixed_str(&mut buf, &self.message, RESPONSE_MESSAGE_LEN);
        buf.extend_from_slice(&[0u8; 8]);
        buf
    }

    /// Decode from the body following the header.
    pub fn decode(body: &[u8]) -> Option<Self> {
        if body.len() < RESPONSE_BODY_LEN {
            return None;
        }
        let command_id = u64::from_le_bytes(body[0..8].try_into().ok()?);
        let original_type = u16::from_le_bytes([body[8], body[9]]);
        let result = match u16::from_le_bytes([body[10], body[11]]) {
            0 => CommandResult::Success,
            1 => CommandResult::Failed,
            2 => CommandResult::InvalidParameter,
            3 => CommandResult::NotFound,
            _ => CommandResult::Timeout,
        };
        let message = read_fixed_str(&body[12..12 + RESPONSE_MESSAGE_LEN]);
        Some(Self {
            command_id,
            original_type,
            result,
            message,
        })
    }
}

/// The 1000-byte resource-monitor response.
///
/// Layout: 22-byte zero header | command code u16 (=0xF000) | response id
/// u32 | boardStates\[9\]\[12\] u8 | taskStates\[9\]\[12\]\[8\] u8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMonitorPacket {
    pub response_id: u32,
    pub board_states: [[u8; MONITOR_BOARDS]; MONITOR_CHASSIS],
    pub task_states: [[[u8; MONITOR_TASKS]; MONITOR_BOARDS]; MONITOR_CHASSIS],
}

impl ResourceMonitorPacket {
    /// Build the packet from a fleet snapshot.
    ///
    /// Board mapping: Normal → 1, everything else → 0. Task cells follow
    /// the backend's reported order; see [`task_state_code`] for the
    /// per-status mapping. Only the first twelve slots per chassis are
    /// represented.
    pub fn from_grid(grid: &ChassisGrid, response_id: u32) -> Self {
        let mut packet = Self {
            response_id,
            board_states: [[0; MONITOR_BOARDS]; MONITOR_CHASSIS],
            task_states: [[[0; MONITOR_TASKS]; MONITOR_BOARDS]; MONITOR_CHASSIS],
        };

        for chassis in grid.iter_initialized() {
            let row = chassis.number() as usize - 1;
            if row >= MONITOR_CHASSIS {
                continue;
            }
            for (col, board) in chassis.boards().iter().take(MONITOR_BOARDS).enumerate() {
                packet.board_states[row][col] = u8::from(board.status() == BoardStatus::Normal);
                for (cell, task) in board.tasks().iter().take(MONITOR_TASKS).enumerate() {
                    packet.task_states[row][col][cell] = task_state_code(&task.task_status);
                }
            }
        }

        packet
    }

    /// Encode the fixed 1000-byte layout.
    pub fn encode(&self) -> [u8; RESOURCE_MONITOR_PACKET_LEN] {
        let mut buf = [0u8; RESOURCE_MONITOR_PACKET_LEN];
        buf[22..24].copy_from_slice(&RESOURCE_MONITOR_COMMAND_CODE.to_le_bytes());
        buf[24..28].copy_from_slice(&self.response_id.to_le_bytes());

        let mut offset = 28;
        for row in &self.board_states {
            buf[offset..offset + MONITOR_BOARDS].copy_from_slice(row);
            offset += MONITOR_BOARDS;
        }
        for row in &self.task_states {
            for board in row {
                buf[offset..offset + MONITOR_TASKS].copy_from_slice(board);
                offset += MONITOR_TASKS;
            }
        }

        buf
    }
}

/// Task-status string to wire cell value.
///
/// `normal` / `running` → 1, empty / `unknown` → 0, anything else → 2.
pub fn task_state_code(status: &str) -> u8 {
    match status {
        "normal" | "running" => 1,
        "" | "unknown" => 0,
        _ => 2,
    }
}

/// Append one alert record (396 bytes) to a batch body.
///
/// Layout: uuid\[64\] | kind u8 | acknowledged u8 | messageCount u16 |
/// timestamp u64 | relatedEntity\[64\] | latest message\[256\].
pub fn encode_alert_record(buf: &mut Vec<u8>, alert: &Alert) {
    put_fixed_str(buf, alert.uuid(), 64);
    buf.push(alert.kind().code() as u8);
    buf.push(u8::from(alert.is_acknowledged()));
    buf.extend_from_slice(&(alert.messages().len() as u16).to_le_bytes());
    buf.extend_from_slice(&alert.timestamp().to_le_bytes());
    put_fixed_str(buf, alert.related_entity(), 64);
    let latest = alert.messages().last().map(|m| m.text.as_str()).unwrap_or("");
    put_fixed_str(buf, latest, 256);
}

/// Append one pipeline label record (1156 bytes) to a batch body.
///
/// Layout: uuid\[64\] | name\[64\] | deploy u8 | running u8 |
/// labelCount u16 | 8 × (labelUUID\[64\] | labelName\[64\]).
pub fn encode_label_record(buf: &mut Vec<u8>, pipeline: &Pipeline) {
    put_fixed_str(buf, &pipeline.uuid, 64);
    put_fixed_str(buf, &pipeline.name, 64);
    buf.push(pipeline.deploy_status.code() as u8);
    buf.push(pipeline.running_status().code() as u8);
    buf.extend_from_slice(&(pipeline.labels().len() as u16).to_le_bytes());
    for slot in 0..8 {
        match pipeline.labels().get(slot) {
            Some(label) => {
                put_fixed_str(buf, &label.uuid, 64);
                put_fixed_str(buf, &label.name, 64);
            }
            None => buf.resize(buf.len() + 128, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareSettings;
    use crate::domain::{LocationInfo, PipelineLabel, TaskSummary};
    use crate::topology::build_topology;

    #[test]
    fn test_header_round_trip() {
        let header = PacketHeader::new(PacketType::Deploy, 42, 1_700_000_000_123, 152);
        let mut buf = Vec::new();
        header.encode_into(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);

        let decoded = PacketHeader::decode(&buf).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_header_wire_layout_is_little_endian() {
        let header = PacketHeader::new(PacketType::CommandResponse, 1, 0x0102030405060708, 10);
        let mut buf = Vec::new();
        header.encode_into(&mut buf);

        assert_eq!(&buf[0..2], &[0x01, 0x20]); // 0x2001 LE
        assert_eq!(&buf[2..4], &[0x01, 0x00]); // version 1
        assert_eq!(&buf[4..8], &[0x01, 0x00, 0x00, 0x00]);
        assert_eq!(
            &buf[8..16],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(&buf[16..20], &[0x0A, 0x00, 0x00, 0x00]);
        assert_eq!(&buf[20..24], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_header_decode_too_short() {
        assert!(PacketHeader::decode(&[0u8; 23]).is_none());
    }

    #[test]
    fn test_fixed_str_round_trip() {
        let mut buf = Vec::new();
        put_fixed_str(&mut buf, "label-1", 16);
        assert_eq!(buf.len(), 16);
        assert_eq!(read_fixed_str(&buf), "label-1");

        // Oversized values are cut at the field width.
        let mut buf = Vec::new();
        put_fixed_str(&mut buf, "abcdefgh", 4);
        assert_eq!(read_fixed_str(&buf), "abcd");

        // A full-width field with no NUL terminator still reads back.
        assert_eq!(read_fixed_str(b"abcd"), "abcd");
    }

    #[test]
    fn test_label_command_round_trip() {
        let command = LabelCommand {
            label_uuid: "label-edge".to_string(),
            operator_id: "operator-7".to_string(),
            command_id: 99,
        };
        let packet = command.encode(PacketType::Deploy, 3, 1_000);
        assert_eq!(packet.len(), HEADER_LEN + COMMAND_BODY_LEN);

        let header = PacketHeader::decode(&packet).unwrap();
        assert_eq!(PacketType::from_u16(header.packet_type), Some(PacketType::Deploy));
        assert_eq!(header.data_length as usize, COMMAND_BODY_LEN);

        let decoded = LabelCommand::decode(&packet[HEADER_LEN..]).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_ack_alert_command_round_trip() {
        let command = AckAlertCommand {
            alert_uuid: "alert-board-1700000000-a1b2c3".to_string(),
            operator_id: "ui-3".to_string(),
            command_id: 7,
        };
        let packet = command.encode(1, 2_000);
        let decoded = AckAlertCommand::decode(&packet[HEADER_LEN..]).unwrap();
        assert_eq!(decoded, command);
    }

    #[test]
    fn test_command_decode_rejects_short_body() {
        assert!(LabelCommand::decode(&[0u8; COMMAND_BODY_LEN - 1]).is_none());
        assert!(AckAlertCommand::decode(&[]).is_none());
    }

    #[test]
    fn test_command_response_round_trip_and_truncation() {
        let long_message = "x".repeat(400);
        let response = CommandResponse::new(
            11,
            PacketType::AckAlert,
            CommandResult::Success,
            long_message,
        );
        let packet = response.encode(5, 3_000);
        assert_eq!(packet.len(), HEADER_LEN + RESPONSE_BODY_LEN);

        let decoded = CommandResponse::decode(&packet[HEADER_LEN..]).unwrap();
        assert_eq!(decoded.command_id, 11);
        assert_eq!(decoded.original_type, PacketType::AckAlert as u16);
        assert_eq!(decoded.result, CommandResult::Success);
        // Message cut at the 256-byte field.
        assert_eq!(decoded.message.len(), RESPONSE_MESSAGE_LEN);
    }

    #[test]
    fn test_packet_type_codes() {
        assert_eq!(PacketType::from_u16(0x1001), Some(PacketType::Deploy));
        assert_eq!(PacketType::from_u16(0x1002), Some(PacketType::Undeploy));
        assert_eq!(PacketType::from_u16(0x1003), Some(PacketType::AckAlert));
        assert_eq!(PacketType::from_u16(0x2001), Some(PacketType::CommandResponse));
        assert_eq!(PacketType::from_u16(0x9999), None);
    }

    #[test]
    fn test_task_state_codes() {
        assert_eq!(task_state_code("normal"), 1);
        assert_eq!(task_state_code("running"), 1);
        assert_eq!(task_state_code(""), 0);
        assert_eq!(task_state_code("unknown"), 0);
        assert_eq!(task_state_code("failed"), 2);
        assert_eq!(task_state_code("stopped"), 2);
    }

    #[test]
    fn test_resource_monitor_packet_layout() {
        let mut grid = build_topology(&HardwareSettings::default());
        // Chassis 1: all boards normal, two tasks on the first compute board.
        for board in grid.chassis_mut()[0].boards_mut() {
            board.apply_report(
                0,
                vec![
                    TaskSummary {
                        task_id: "t1".to_string(),
                        task_status: "running".to_string(),
                        ..Default::default()
                    },
                    TaskSummary {
                        task_id: "t2".to_string(),
                        task_status: "failed".to_string(),
                        ..Default::default()
                    },
                ],
            );
        }

        let packet = ResourceMonitorPacket::from_grid(&grid, 77);
        let bytes = packet.encode();

        assert_eq!(bytes.len(), RESOURCE_MONITOR_PACKET_LEN);
        // 22-byte opaque header is zero-filled.
        assert!(bytes[..22].iter().all(|&b| b == 0));
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 0xF000);
        assert_eq!(u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]), 77);

        // Chassis 1 row: all twelve represented boards normal.
        assert!(bytes[28..40].iter().all(|&b| b == 1));
        // Chassis 2 row untouched (status Unknown maps to 0).
        assert!(bytes[40..52].iter().all(|&b| b == 0));

        // First board's task cells: running=1, failed=2, rest empty.
        let task_base = 136;
        assert_eq!(bytes[task_base], 1);
        assert_eq!(bytes[task_base + 1], 2);
        assert!(bytes[task_base + 2..task_base + 8].iter().all(|&b| b == 0));

        // Switch board (slot 6) carries no tasks.
        let slot6_base = task_base + 5 * MONITOR_TASKS;
        assert!(bytes[slot6_base..slot6_base + 8].iter().all(|&b| b == 0));

        // Every cell within the allowed alphabet.
        assert!(bytes[28..136].iter().all(|&b| b <= 1));
        assert!(bytes[136..].iter().all(|&b| b <= 2));
    }

    #[test]
    fn test_alert_record_layout() {
        let mut alert = Alert::board(
            "alert-board-1-abc",
            LocationInfo {
                board_address: "192.168.1.103".to_string(),
                ..Default::default()
            },
            &["first".to_string(), "latest".to_string()],
        );
        alert.acknowledge();

        let mut buf = Vec::new();
        encode_alert_record(&mut buf, &alert);
        assert_eq!(buf.len(), ALERT_RECORD_LEN);

        assert_eq!(read_fixed_str(&buf[0..64]), "alert-board-1-abc");
        assert_eq!(buf[64], 0); // board kind
        assert_eq!(buf[65], 1); // acknowledged
        assert_eq!(u16::from_le_bytes([buf[66], buf[67]]), 2);
        assert_eq!(read_fixed_str(&buf[76..140]), "192.168.1.103");
        assert_eq!(read_fixed_str(&buf[140..396]), "latest");
    }

    #[test]
    fn test_label_record_layout() {
        let mut pipeline = Pipeline::new("stack-1", "detector");
        pipeline.add_label(PipelineLabel {
            name: "edge".to_string(),
            uuid: "label-1".to_string(),
        });

        let mut buf = Vec::new();
        encode_label_record(&mut buf, &pipeline);
        assert_eq!(buf.len(), LABEL_RECORD_LEN);

        assert_eq!(read_fixed_str(&buf[0..64]), "stack-1");
        assert_eq!(read_fixed_str(&buf[64..128]), "detector");
        assert_eq!(buf[128], 0); // undeployed
        assert_eq!(buf[129], 1); // running normally
        assert_eq!(u16::from_le_bytes([buf[130], buf[131]]), 1);
        assert_eq!(read_fixed_str(&buf[132..196]), "label-1");
        assert_eq!(read_fixed_str(&buf[196..260]), "edge");
        // Unused label slots stay zeroed.
        assert!(buf[260..].iter().all(|&b| b == 0));
    }
}
