//! Serial transport seam, device enumeration, and the blocking session.
//!
//! The native USB-serial driver lives outside this crate; [`SerialBridge`]
//! and [`SerialPort`] are the contract it implements. Everything above them
//! is synchronous and single-threaded: one in-flight command/reply exchange
//! per session, exclusive ownership of the open port.

mod bridge;
mod directory;
mod error;
mod session;

pub use bridge::{
    DataBits, FlowControl, Parity, PORT_FLAG_HIGH_SPEED, PORT_FLAG_OPENED, PortInfo,
    PurgeDirection, SerialBridge, SerialPort, StopBits,
};
pub use directory::{DeviceDescriptor, DeviceDirectory};
pub use error::TransportError;
pub use session::{CommandError, ConnectError, DeviceSession, WriteError};
