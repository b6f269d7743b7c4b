//! `aptlink` - Command/response control link for APT motorized actuators
//!
//! This library frames APT motion-control commands over a USB-to-serial
//! bridge and drives the homing / relative-move state machines on top of
//! the raw byte stream. The native bridge driver stays outside the crate:
//! callers supply an implementation of the [`SerialBridge`] and
//! [`SerialPort`] traits and the core does the rest.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aptlink::{DeviceDirectory, DeviceSession, MotionController, SerialBridge};
//!
//! # fn demo(bridge: Arc<dyn SerialBridge>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut directory = DeviceDirectory::new(bridge.clone());
//! directory.enumerate()?;
//!
//! let mut session = DeviceSession::new(bridge);
//! session.connect("83000001", &directory)?;
//!
//! let mut controller = MotionController::new(&mut session);
//! controller.home()?;
//! controller.move_relative(100_000)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Layers
//!
//! - [`protocol`] - the fixed-offset wire codec (6-byte headers, long-form
//!   payload continuation, status bitfields); no I/O.
//! - [`transport`] - the serial bridge seam, device enumeration, and the
//!   blocking request/response session.
//! - [`motion`] - per-operation state machines polled over a session.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod motion;
pub mod protocol;
pub mod transport;

pub use motion::{MotionConfig, MotionController, MotionError, MotionOperation};
pub use protocol::{
    DeviceFamily, HEADER_SIZE, MessageHeader, MessageId, ProtocolError, Reply, ReplyClass,
    StatusBits, classify,
};
pub use transport::{
    ConnectError, DeviceDescriptor, DeviceDirectory, DeviceSession, PortInfo, SerialBridge,
    SerialPort, TransportError, WriteError,
};

/// Vendor ID of the USB-serial bridge chips used by this controller family.
pub const VENDOR_ID: u16 = 0x0403;

/// Fixed line rate negotiated at connect time.
pub const BAUD_RATE: u32 = 115_200;
