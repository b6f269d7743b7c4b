//! APT message identifiers, reply classification, and status bitfields.

use std::fmt;

/// APT message identifiers relevant to this core (16-bit, little-endian on
/// the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageId {
    /// Request hardware info
    HwReqInfo = 0x0005,
    /// Hardware info reply
    HwGetInfo = 0x0006,
    /// Move home command
    MoveHome = 0x0443,
    /// Move homed (terminal)
    MoveHomed = 0x0444,
    /// Move relative command (long-form)
    MoveRelative = 0x0448,
    /// Move complete (terminal)
    MoveComplete = 0x0464,
    /// Request status update (stepper family)
    ReqStatusUpdate = 0x0480,
    /// Status update (stepper family)
    GetStatusUpdate = 0x0481,
    /// Request status update (DC-servo family)
    ReqDcStatusUpdate = 0x0490,
    /// Status update (DC-servo family)
    GetDcStatusUpdate = 0x0491,
}

impl MessageId {
    /// Convert from a wire value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0005 => Some(Self::HwReqInfo),
            0x0006 => Some(Self::HwGetInfo),
            0x0443 => Some(Self::MoveHome),
            0x0444 => Some(Self::MoveHomed),
            0x0448 => Some(Self::MoveRelative),
            0x0464 => Some(Self::MoveComplete),
            0x0480 => Some(Self::ReqStatusUpdate),
            0x0481 => Some(Self::GetStatusUpdate),
            0x0490 => Some(Self::ReqDcStatusUpdate),
            0x0491 => Some(Self::GetDcStatusUpdate),
            _ => None,
        }
    }

    /// Convert to the wire value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check whether this identifier is a motor status update
    #[must_use]
    pub const fn is_status_update(self) -> bool {
        matches!(self, Self::GetStatusUpdate | Self::GetDcStatusUpdate)
    }

    /// Check whether this identifier signals operation completion by itself
    #[must_use]
    pub const fn is_motion_terminal(self) -> bool {
        matches!(self, Self::MoveHomed | Self::MoveComplete)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HwReqInfo => "HwReqInfo",
            Self::HwGetInfo => "HwGetInfo",
            Self::MoveHome => "MoveHome",
            Self::MoveHomed => "MoveHomed",
            Self::MoveRelative => "MoveRelative",
            Self::MoveComplete => "MoveComplete",
            Self::ReqStatusUpdate => "ReqStatusUpdate",
            Self::GetStatusUpdate => "GetStatusUpdate",
            Self::ReqDcStatusUpdate => "ReqDcStatusUpdate",
            Self::GetDcStatusUpdate => "GetDcStatusUpdate",
        };
        write!(f, "{name}")
    }
}

/// Dispatch classes for inbound frames, keyed on the message identifier.
///
/// The motion controller uses this to pick a decode path; `Unknown` frames
/// yield no result rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// Identifier not recognised by this core
    Unknown,
    /// A motor status update carrying a status bitfield
    MotorStatus,
    /// A bare terminal frame whose identifier alone signals completion
    MotionTerminal,
}

/// Controller family, detected at connect time from the device descriptor.
///
/// The two families share the status frame layout but disagree on the
/// meaning of the 16-bit field at offset 12 and use different status-request
/// identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceFamily {
    /// DC-servo controllers (velocity field, 0x0490/0x0491 status pair)
    #[default]
    DcServo,
    /// Stepper controllers (encoder field, 0x0480/0x0481 status pair)
    Stepper,
}

impl DeviceFamily {
    /// Status-request identifier used by this family
    #[must_use]
    pub const fn status_request_id(self) -> MessageId {
        match self {
            Self::DcServo => MessageId::ReqDcStatusUpdate,
            Self::Stepper => MessageId::ReqStatusUpdate,
        }
    }
}

/// The 32-bit status word reported in motor status frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusBits(u32);

impl StatusBits {
    /// Axis in motion (either direction, jogging or moving)
    pub const MOVING: u32 = 0x00f0;
    /// Homing in progress
    pub const HOMING: u32 = 0x0200;
    /// Homing complete
    pub const HOMED: u32 = 0x0400;

    /// Wrap a raw status word
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw status word
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check an arbitrary mask
    #[must_use]
    pub const fn has(self, mask: u32) -> bool {
        (self.0 & mask) != 0
    }

    /// Check the in-motion bits
    #[must_use]
    pub const fn is_moving(self) -> bool {
        self.has(Self::MOVING)
    }

    /// Check the homing-in-progress bit
    #[must_use]
    pub const fn is_homing(self) -> bool {
        self.has(Self::HOMING)
    }

    /// Check the homed bit
    #[must_use]
    pub const fn is_homed(self) -> bool {
        self.has(Self::HOMED)
    }
}

impl fmt::Display for StatusBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.is_moving() {
            parts.push("MOVING");
        }
        if self.is_homing() {
            parts.push("HOMING");
        }
        if self.is_homed() {
            parts.push("HOMED");
        }
        if parts.is_empty() {
            write!(f, "IDLE({:#010x})", self.0)
        } else {
            write!(f, "{}", parts.join(" | "))
        }
    }
}
