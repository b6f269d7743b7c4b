//! Traits implemented by the native USB-serial bridge driver.
//!
//! The crate only depends on this abstract capability; a production build
//! binds it to the vendor driver, tests bind it to scripted fakes.

use std::time::Duration;

use super::TransportError;

/// Status flag bit: the port is already opened by some process.
pub const PORT_FLAG_OPENED: u32 = 0x1;
/// Status flag bit: the device enumerated as a high-speed part.
pub const PORT_FLAG_HIGH_SPEED: u32 = 0x2;

/// Word length settings accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    /// Seven data bits
    Seven,
    /// Eight data bits
    Eight,
}

/// Stop bit settings accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit
    One,
    /// Two stop bits
    Two,
}

/// Parity settings accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
    /// Mark parity
    Mark,
    /// Space parity
    Space,
}

/// Flow control settings accepted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    /// No flow control
    None,
    /// Hardware RTS/CTS handshaking
    RtsCts,
    /// Hardware DTR/DSR handshaking
    DtrDsr,
    /// Software XON/XOFF handshaking
    XonXoff,
}

/// Buffer selection for a purge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeDirection(u8);

impl PurgeDirection {
    /// Purge the receive buffer
    pub const RX: Self = Self(0x1);
    /// Purge the transmit buffer
    pub const TX: Self = Self(0x2);
    /// Purge both buffers
    pub const BOTH: Self = Self(0x3);

    /// Whether the receive buffer is selected
    #[must_use]
    pub const fn includes_rx(self) -> bool {
        self.0 & Self::RX.0 != 0
    }

    /// Whether the transmit buffer is selected
    #[must_use]
    pub const fn includes_tx(self) -> bool {
        self.0 & Self::TX.0 != 0
    }
}

/// Raw per-device detail reported by the driver's enumeration pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortInfo {
    /// Driver status flags (see `PORT_FLAG_*`)
    pub flags: u32,
    /// Bridge chip type code
    pub device_type: u32,
    /// Combined vendor/product identifier (vendor high, product low)
    pub id: u32,
    /// USB location identifier
    pub location_id: u32,
    /// Device serial number
    pub serial_number: String,
    /// Device description string
    pub description: String,
}

/// Device enumeration and port opening, implemented by the native driver.
pub trait SerialBridge: Send + Sync {
    /// Number of attached devices visible to the driver.
    fn device_count(&self) -> Result<u32, TransportError>;

    /// Descriptor detail for the device at `index`.
    fn device_info(&self, index: u32) -> Result<PortInfo, TransportError>;

    /// Open the device with the given serial number.
    fn open(&self, serial_number: &str) -> Result<Box<dyn SerialPort>, TransportError>;
}

/// An open byte-stream handle to one device.
///
/// Dropping the port closes the handle; there is no separate close call.
pub trait SerialPort: Send {
    /// Read up to `buf.len()` bytes, returning the count actually read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write the buffer, returning the count actually written.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Set the line baud rate.
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), TransportError>;

    /// Set word length, stop bits, and parity.
    fn set_data_characteristics(
        &mut self,
        data_bits: DataBits,
        stop_bits: StopBits,
        parity: Parity,
    ) -> Result<(), TransportError>;

    /// Set the flow control mode and software handshake characters.
    fn set_flow_control(
        &mut self,
        flow: FlowControl,
        xon: u8,
        xoff: u8,
    ) -> Result<(), TransportError>;

    /// Send a reset to the device.
    fn reset_device(&mut self) -> Result<(), TransportError>;

    /// Discard buffered bytes in the selected direction(s).
    fn purge(&mut self, direction: PurgeDirection) -> Result<(), TransportError>;

    /// Configure driver-side read and write timeouts.
    fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), TransportError>;

    /// Number of bytes currently queued in the receive buffer.
    fn queued_bytes(&mut self) -> Result<u32, TransportError>;
}
