//! APT protocol core: wire format, message types, and codec.
//!
//! Everything here is pure byte manipulation at fixed offsets; no I/O.

mod codec;
mod error;
mod header;
mod message;
mod types;

pub use codec::{
    classify, decode_reply, hardware_info_request, move_home, move_relative, simple_command,
    status_request,
};
pub use error::{ProtocolError, Result};
pub use header::MessageHeader;
pub use message::{AxisReading, HardwareInfo, MotorStatus, Reply};
pub use types::{DeviceFamily, MessageId, ReplyClass, StatusBits};

/// Header size in bytes. Every frame starts with exactly this many bytes.
pub const HEADER_SIZE: usize = 6;

/// Total size of a motor status frame (header + 14-byte body).
pub const MOTOR_STATUS_SIZE: usize = 20;

/// Total size of a move-relative command frame (header + 6-byte payload).
pub const MOVE_RELATIVE_SIZE: usize = 12;

/// Total size of a hardware info reply frame (header + 84-byte body).
pub const HARDWARE_INFO_SIZE: usize = 90;

/// Destination address of a single-channel controller.
pub const HOST_DESTINATION: u8 = 0x21;

/// Source address of the host.
pub const HOST_SOURCE: u8 = 0x01;

/// High bit of the destination byte; set on long-form (payload-carrying) frames.
pub const LONG_FORM_BIT: u8 = 0x80;
