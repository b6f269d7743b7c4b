//! Typed views over inbound APT frames.
//!
//! Each decode reinterprets a byte buffer of the exact expected size as a
//! fixed-layout structure; a length mismatch is a [`ProtocolError`], never
//! an I/O failure.

use std::fmt;

use super::{
    DeviceFamily, HARDWARE_INFO_SIZE, HEADER_SIZE, MOTOR_STATUS_SIZE, MessageId, ProtocolError,
    StatusBits,
};

/// The family-dependent 16-bit field at offset 12 of a status frame.
///
/// DC-servo controllers report velocity there; steppers report an encoder
/// count. Keying on [`DeviceFamily`] at decode time removes the aliased
/// offsets the wire layout shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisReading {
    /// Velocity (DC-servo family)
    Velocity(u16),
    /// Encoder count (stepper family)
    EncoderCount(u16),
}

/// A decoded motor status update (0x0481 / 0x0491).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotorStatus {
    /// Channel the update refers to
    pub channel: u16,
    /// Axis position in device units
    pub position: i32,
    /// Family-dependent reading at offset 12
    pub reading: AxisReading,
    /// Status bitfield
    pub status: StatusBits,
}

impl MotorStatus {
    /// Decode a complete status frame (header included).
    ///
    /// The aliased 16-bit field is tagged according to `family`.
    pub fn decode(bytes: &[u8], family: DeviceFamily) -> super::Result<Self> {
        if bytes.len() != MOTOR_STATUS_SIZE {
            return Err(ProtocolError::MalformedMessage {
                message: "MotorStatus",
                expected: MOTOR_STATUS_SIZE,
                got: bytes.len(),
            });
        }

        let body = &bytes[HEADER_SIZE..];
        let raw_reading = u16::from_le_bytes([body[6], body[7]]);
        let reading = match family {
            DeviceFamily::DcServo => AxisReading::Velocity(raw_reading),
            DeviceFamily::Stepper => AxisReading::EncoderCount(raw_reading),
        };

        Ok(Self {
            channel: u16::from_le_bytes([body[0], body[1]]),
            position: i32::from_le_bytes([body[2], body[3], body[4], body[5]]),
            reading,
            status: StatusBits::new(u32::from_le_bytes([body[10], body[11], body[12], body[13]])),
        })
    }
}

impl fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channel {} position {} status {}",
            self.channel, self.position, self.status
        )
    }
}

/// A decoded hardware info reply (0x0006).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareInfo {
    /// Device serial number
    pub serial_number: u32,
    /// Model name (ASCII, trailing NULs stripped)
    pub model: String,
    /// Hardware type code
    pub hardware_type: u16,
    /// Firmware version, minor-to-major byte order as reported
    pub firmware_version: [u8; 4],
    /// Free-text notes (ASCII, trailing NULs stripped)
    pub notes: String,
    /// Hardware version word
    pub hardware_version: u16,
    /// Modification state
    pub mod_state: u16,
    /// Number of channels
    pub channel_count: u16,
}

impl HardwareInfo {
    /// Decode a complete hardware info frame (header included).
    pub fn decode(bytes: &[u8]) -> super::Result<Self> {
        if bytes.len() != HARDWARE_INFO_SIZE {
            return Err(ProtocolError::MalformedMessage {
                message: "HardwareInfo",
                expected: HARDWARE_INFO_SIZE,
                got: bytes.len(),
            });
        }

        let body = &bytes[HEADER_SIZE..];
        let mut firmware_version = [0u8; 4];
        firmware_version.copy_from_slice(&body[14..18]);

        Ok(Self {
            serial_number: u32::from_le_bytes([body[0], body[1], body[2], body[3]]),
            model: ascii_field(&body[4..12]),
            hardware_type: u16::from_le_bytes([body[12], body[13]]),
            firmware_version,
            notes: ascii_field(&body[18..66]),
            // 12 reserved bytes at 66..78
            hardware_version: u16::from_le_bytes([body[78], body[79]]),
            mod_state: u16::from_le_bytes([body[80], body[81]]),
            channel_count: u16::from_le_bytes([body[82], body[83]]),
        })
    }
}

impl fmt::Display for HardwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Serial Number = {}", self.serial_number)?;
        writeln!(f, "Model = {}", self.model)?;
        writeln!(f, "Type = {}", self.hardware_type)?;
        writeln!(
            f,
            "Version = {}.{}.{}.{}",
            self.firmware_version[0],
            self.firmware_version[1],
            self.firmware_version[2],
            self.firmware_version[3]
        )?;
        writeln!(
            f,
            "Hardware Version = {}.{}",
            (self.hardware_version >> 8) as u8,
            (self.hardware_version & 0xFF) as u8
        )?;
        writeln!(f, "Mod State = {}", self.mod_state)?;
        writeln!(f, "Notes = {}", self.notes)?;
        writeln!(f, "Number of Channels = {}", self.channel_count)
    }
}

/// A classified and decoded inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A motor status update
    Status(MotorStatus),
    /// A terminal frame; the identifier alone signals completion
    Terminal(MessageId),
}

fn ascii_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
