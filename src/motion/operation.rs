//! The closed set of motion operations.

use crate::protocol::{MessageId, StatusBits, move_home, move_relative};

/// A motion operation and its parameters.
///
/// Each variant co-locates its command frame, its terminal message
/// identifier, and the status-bit predicates that mark the start and end of
/// the physical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOperation {
    /// Home the axis against its reference switch
    Home,
    /// Move the axis by a signed distance in device units
    MoveRelative {
        /// Target channel (1 for single-channel controllers)
        channel: u16,
        /// Signed distance in device units
        distance: i32,
    },
}

impl MotionOperation {
    /// Encode the command frame that starts this operation.
    #[must_use]
    pub fn command(&self) -> Vec<u8> {
        match *self {
            Self::Home => move_home().to_vec(),
            Self::MoveRelative { channel, distance } => move_relative(channel, distance),
        }
    }

    /// Terminal message identifier that completes this operation on its own.
    #[must_use]
    pub const fn terminal_id(&self) -> MessageId {
        match self {
            Self::Home => MessageId::MoveHomed,
            Self::MoveRelative { .. } => MessageId::MoveComplete,
        }
    }

    /// Whether a status word shows the operation has started.
    #[must_use]
    pub const fn started(&self, status: StatusBits) -> bool {
        match self {
            Self::Home => status.is_homing(),
            Self::MoveRelative { .. } => status.is_moving(),
        }
    }

    /// Whether a status word shows the operation has completed.
    #[must_use]
    pub const fn completed(&self, status: StatusBits) -> bool {
        match self {
            Self::Home => status.is_homed(),
            Self::MoveRelative { .. } => !status.is_moving(),
        }
    }
}
