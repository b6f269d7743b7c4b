//! APT command encoders and reply dispatch.
//!
//! Commands are assembled at fixed byte offsets; replies are classified by
//! message identifier and handed to the matching typed decode.

use super::{
    DeviceFamily, HEADER_SIZE, HOST_DESTINATION, HOST_SOURCE, MessageHeader, MessageId,
    MotorStatus, Reply, ReplyClass,
};

/// Build a short-form single-channel command frame.
///
/// Single-channel controllers are addressed at 0x21; multi-channel variants
/// add the zero-indexed channel to the destination.
#[must_use]
pub fn simple_command(id: MessageId, param1: u8, param2: u8) -> [u8; HEADER_SIZE] {
    MessageHeader::short(id.as_u16(), param1, param2, HOST_DESTINATION, HOST_SOURCE).to_bytes()
}

/// Encode a move-home command.
#[must_use]
pub fn move_home() -> [u8; HEADER_SIZE] {
    simple_command(MessageId::MoveHome, 1, 0)
}

/// Encode the status-request appropriate for the device family.
#[must_use]
pub fn status_request(family: DeviceFamily) -> [u8; HEADER_SIZE] {
    simple_command(family.status_request_id(), 1, 0)
}

/// Encode a hardware-info request.
#[must_use]
pub fn hardware_info_request() -> [u8; HEADER_SIZE] {
    simple_command(MessageId::HwReqInfo, 1, 0)
}

/// Encode a long-form move-relative command: header announcing a 6-byte
/// payload, then channel and signed distance, all little-endian.
#[must_use]
pub fn move_relative(channel: u16, distance: i32) -> Vec<u8> {
    let header = MessageHeader::long(
        MessageId::MoveRelative.as_u16(),
        6,
        HOST_DESTINATION,
        HOST_SOURCE,
    );

    let mut bytes = Vec::with_capacity(super::MOVE_RELATIVE_SIZE);
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&channel.to_le_bytes());
    bytes.extend_from_slice(&distance.to_le_bytes());
    bytes
}

/// Classify a message identifier into its decode path.
///
/// Identifiers outside the motion vocabulary are `Unknown`; that is not an
/// error, the poll loops simply ignore such frames.
#[must_use]
pub fn classify(message_id: u16) -> ReplyClass {
    match MessageId::from_u16(message_id) {
        Some(id) if id.is_status_update() => ReplyClass::MotorStatus,
        Some(id) if id.is_motion_terminal() => ReplyClass::MotionTerminal,
        _ => ReplyClass::Unknown,
    }
}

/// Decode an inbound frame into a typed reply.
///
/// Returns `Ok(None)` for frames this core does not interpret (unknown
/// identifiers or buffers shorter than a header). A recognised status frame
/// of the wrong size is a protocol error.
pub fn decode_reply(bytes: &[u8], family: DeviceFamily) -> super::Result<Option<Reply>> {
    if bytes.len() < HEADER_SIZE {
        return Ok(None);
    }

    let message_id = u16::from_le_bytes([bytes[0], bytes[1]]);
    match classify(message_id) {
        ReplyClass::MotorStatus => Ok(Some(Reply::Status(MotorStatus::decode(bytes, family)?))),
        ReplyClass::MotionTerminal => {
            let id = MessageId::from_u16(message_id).expect("classified terminal id");
            Ok(Some(Reply::Terminal(id)))
        }
        ReplyClass::Unknown => Ok(None),
    }
}
