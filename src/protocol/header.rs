//! APT message header
//!
//! Every frame starts with the same 6 bytes. Bytes 2-3 are overloaded: on a
//! short-form frame they carry two one-byte parameters; on a long-form frame
//! (destination high bit set) they carry the little-endian length of the
//! payload that follows the header.

use super::{HEADER_SIZE, LONG_FORM_BIT, ProtocolError};

/// APT message header (6 bytes, little-endian)
///
/// # Wire Format
///
/// ```text
///  0               1               2               3
///  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
/// +---------------+---------------+---------------+---------------+
/// |          Message ID (2)       |    Param1     |    Param2     |
/// +---------------+---------------+---------------+---------------+
/// |  Destination  |    Source     |
/// +---------------+---------------+
/// ```
///
/// When bit 0x80 of the destination byte is set, bytes 2-3 are instead the
/// packet length of the payload following the header. That bit is the sole
/// discriminator between short and long form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    message_id: u16,
    param_bytes: [u8; 2],
    destination: u8,
    source: u8,
}

impl MessageHeader {
    /// Create a short-form header
    #[must_use]
    pub const fn short(message_id: u16, param1: u8, param2: u8, destination: u8, source: u8) -> Self {
        Self {
            message_id,
            param_bytes: [param1, param2],
            destination,
            source,
        }
    }

    /// Create a long-form header announcing `packet_length` payload bytes
    ///
    /// Sets the destination high bit; the caller passes the plain address.
    #[must_use]
    pub const fn long(message_id: u16, packet_length: u16, destination: u8, source: u8) -> Self {
        Self {
            message_id,
            param_bytes: packet_length.to_le_bytes(),
            destination: destination | LONG_FORM_BIT,
            source,
        }
    }

    /// Message identifier (raw wire value)
    #[must_use]
    pub const fn message_id(&self) -> u16 {
        self.message_id
    }

    /// First parameter byte (short-form interpretation of byte 2)
    #[must_use]
    pub const fn param1(&self) -> u8 {
        self.param_bytes[0]
    }

    /// Second parameter byte (short-form interpretation of byte 3)
    #[must_use]
    pub const fn param2(&self) -> u8 {
        self.param_bytes[1]
    }

    /// Payload length (long-form interpretation of bytes 2-3)
    #[must_use]
    pub const fn packet_length(&self) -> u16 {
        u16::from_le_bytes(self.param_bytes)
    }

    /// Destination address, including the long-form bit if set
    #[must_use]
    pub const fn destination(&self) -> u8 {
        self.destination
    }

    /// Source address
    #[must_use]
    pub const fn source(&self) -> u8 {
        self.source
    }

    /// Whether a payload of `packet_length` bytes follows this header
    #[must_use]
    pub const fn is_long_form(&self) -> bool {
        (self.destination & LONG_FORM_BIT) != 0
    }

    /// Serialize to wire bytes (little-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.message_id.to_le_bytes());
        bytes[2] = self.param_bytes[0];
        bytes[3] = self.param_bytes[1];
        bytes[4] = self.destination;
        bytes[5] = self.source;
        bytes
    }

    /// Parse from wire bytes
    ///
    /// Never fails on a well-formed 6-byte buffer; the only error is a
    /// buffer shorter than the header.
    pub fn from_bytes(bytes: &[u8]) -> super::Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ProtocolError::TruncatedHeader { got: bytes.len() });
        }

        Ok(Self {
            message_id: u16::from_le_bytes([bytes[0], bytes[1]]),
            param_bytes: [bytes[2], bytes[3]],
            destination: bytes[4],
            source: bytes[5],
        })
    }
}
