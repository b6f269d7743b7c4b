//! One open logical connection to a device.
//!
//! [`DeviceSession`] owns the port handle exclusively: one in-flight
//! command/reply exchange at a time, blocking waits with a fixed 100 ms
//! occupancy tick, and stale-message flushing before new operations.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::BAUD_RATE;
use crate::protocol::{
    DeviceFamily, HARDWARE_INFO_SIZE, HEADER_SIZE, HardwareInfo, MessageHeader, ProtocolError,
    hardware_info_request,
};

use super::bridge::{DataBits, FlowControl, Parity, PurgeDirection, SerialBridge, SerialPort, StopBits};
use super::directory::{DeviceDescriptor, DeviceDirectory};
use super::error::TransportError;

/// Receive-buffer occupancy is polled at this fixed tick; waits never spin
/// faster than it.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Budget for the payload continuation of a long-form frame once its header
/// has been read.
pub const CONTINUATION_TIMEOUT: Duration = Duration::from_millis(200);

/// Driver-side read/write timeout installed at connect time.
const LINE_TIMEOUT: Duration = Duration::from_millis(300);

/// Budget for the hardware info reply.
const HARDWARE_INFO_TIMEOUT: Duration = Duration::from_millis(2000);

/// XON character installed with RTS/CTS flow control.
const XON: u8 = 0x11;
/// XOFF character installed with RTS/CTS flow control.
const XOFF: u8 = 0x13;

/// Errors from [`DeviceSession::connect`].
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The serial number precondition failed
    #[error("serial number must not be empty")]
    EmptySerialNumber,

    /// The serial number is not in the directory snapshot
    #[error("device {0} is not in the enumeration snapshot")]
    UnknownDevice(String),

    /// The driver refused to open the port
    #[error("failed to open device")]
    Open(#[source] TransportError),

    /// One or more initialization steps failed during best-effort bring-up
    #[error("device bring-up failed ({failed} initialization steps)")]
    BringUp {
        /// Number of initialization steps that reported failure
        failed: usize,
    },
}

/// Errors from [`DeviceSession::send_command`].
#[derive(Error, Debug)]
pub enum WriteError {
    /// The driver reported a transport failure
    #[error("transport write failed")]
    Transport(#[from] TransportError),

    /// The driver accepted fewer bytes than requested
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes the driver accepted
        written: usize,
        /// Bytes requested
        expected: usize,
    },
}

/// Errors from complete request/reply exchanges such as
/// [`DeviceSession::hardware_info`].
#[derive(Error, Debug)]
pub enum CommandError {
    /// Sending the request failed
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Waiting for the reply failed at the transport
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply arrived but did not decode
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No reply arrived within the budget
    #[error("no reply within {0:?}")]
    NoReply(Duration),
}

/// One open logical connection: message send, blocking wait-for-reply, and
/// multi-part frame assembly.
pub struct DeviceSession {
    bridge: Arc<dyn SerialBridge>,
    port: Option<Box<dyn SerialPort>>,
    descriptor: Option<DeviceDescriptor>,
}

impl DeviceSession {
    /// Create a disconnected session over the given bridge driver.
    #[must_use]
    pub fn new(bridge: Arc<dyn SerialBridge>) -> Self {
        Self {
            bridge,
            port: None,
            descriptor: None,
        }
    }

    /// Whether a port is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    /// Descriptor of the connected device, if any.
    #[must_use]
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Controller family of the connected device.
    #[must_use]
    pub fn family(&self) -> DeviceFamily {
        self.descriptor
            .as_ref()
            .map(DeviceDescriptor::family)
            .unwrap_or_default()
    }

    /// Close the port, if open. Idempotent.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("session closed");
        }
        self.descriptor = None;
    }

    /// Connect to the device with the given serial number and run the fixed
    /// initialization sequence.
    ///
    /// Any prior open port on this session is closed first. The descriptor
    /// is resolved against the directory's last enumeration snapshot. Every
    /// bring-up step is attempted even after a failure; the overall result
    /// reports failure if any step did.
    #[instrument(level = "debug", skip(self, directory))]
    pub fn connect(
        &mut self,
        serial_number: &str,
        directory: &DeviceDirectory,
    ) -> Result<(), ConnectError> {
        self.close();

        if serial_number.is_empty() {
            return Err(ConnectError::EmptySerialNumber);
        }

        let descriptor = directory
            .lookup(serial_number)
            .cloned()
            .ok_or_else(|| ConnectError::UnknownDevice(serial_number.to_string()))?;

        let mut port = self.bridge.open(serial_number).map_err(ConnectError::Open)?;

        let mut failed = 0usize;
        let mut step = |name: &str, result: Result<(), TransportError>| {
            if let Err(err) = result {
                warn!(step = name, error = %err, "bring-up step failed");
                failed += 1;
            }
        };

        step("baud", port.set_baud_rate(BAUD_RATE));
        step(
            "line",
            port.set_data_characteristics(DataBits::Eight, StopBits::One, Parity::None),
        );
        step(
            "flow",
            port.set_flow_control(FlowControl::RtsCts, XON, XOFF),
        );
        step("reset", port.reset_device());
        step("purge", port.purge(PurgeDirection::BOTH));
        step("reset", port.reset_device());
        // extend the driver timeout while the board finishes its reset
        step("timeouts", port.set_timeouts(LINE_TIMEOUT, LINE_TIMEOUT));

        if failed > 0 {
            return Err(ConnectError::BringUp { failed });
        }

        debug!(serial_number, family = ?descriptor.family(), "session connected");
        self.port = Some(port);
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Write a complete command buffer to the device.
    ///
    /// A short write is reported distinctly from a transport failure.
    pub fn send_command(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        let port = self.port_mut()?;
        let written = port.write(bytes)?;
        if written != bytes.len() {
            return Err(WriteError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }
        trace!(len = bytes.len(), "command written");
        Ok(())
    }

    /// Wait until `size` bytes are buffered, then read exactly that many.
    ///
    /// Occupancy is polled every 100 ms; `Ok(None)` means the budget elapsed
    /// first, which is not an error. A zero timeout degenerates to a single
    /// non-blocking poll.
    pub fn wait_for_fixed_reply(
        &mut self,
        size: usize,
        timeout: Duration,
    ) -> Result<Option<Bytes>, TransportError> {
        let port = match self.port.as_mut() {
            Some(port) => port,
            None => return Err(TransportError::InvalidHandle),
        };

        let deadline = Instant::now() + timeout;
        loop {
            if port.queued_bytes()? as usize >= size {
                let mut buf = vec![0u8; size];
                let read = port.read(&mut buf)?;
                if read != size {
                    return Err(TransportError::General(format!(
                        "short read: {read} of {size} bytes"
                    )));
                }
                return Ok(Some(Bytes::from(buf)));
            }
            if timeout.is_zero() {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    /// Wait for one complete frame: a 6-byte header, plus the payload
    /// continuation when the header announces long form.
    ///
    /// The continuation gets its own fixed 200 ms budget; if it times out
    /// the already-consumed header bytes are discarded, not buffered for a
    /// future call.
    pub fn wait_for_framed_reply(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<Bytes>, TransportError> {
        let Some(header_bytes) = self.wait_for_fixed_reply(HEADER_SIZE, timeout)? else {
            return Ok(None);
        };

        let header = MessageHeader::from_bytes(&header_bytes).expect("exactly 6 header bytes");
        if !header.is_long_form() {
            return Ok(Some(header_bytes));
        }

        let payload_len = usize::from(header.packet_length());
        let Some(payload) = self.wait_for_fixed_reply(payload_len, CONTINUATION_TIMEOUT)? else {
            trace!(
                message_id = header.message_id(),
                payload_len, "long-form continuation timed out; frame dropped"
            );
            return Ok(None);
        };

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload_len);
        frame.extend_from_slice(&header_bytes);
        frame.extend_from_slice(&payload);
        Ok(Some(frame.freeze()))
    }

    /// Drain any backlog of unread frames before starting a new operation.
    pub fn flush_pending(&mut self) -> Result<(), TransportError> {
        while self.wait_for_framed_reply(Duration::ZERO)?.is_some() {}
        Ok(())
    }

    /// Request and decode the device's hardware info block.
    #[instrument(level = "debug", skip(self))]
    pub fn hardware_info(&mut self) -> Result<HardwareInfo, CommandError> {
        self.send_command(&hardware_info_request())?;

        let reply = self
            .wait_for_fixed_reply(HARDWARE_INFO_SIZE, HARDWARE_INFO_TIMEOUT)?
            .ok_or(CommandError::NoReply(HARDWARE_INFO_TIMEOUT))?;

        Ok(HardwareInfo::decode(&reply)?)
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::InvalidHandle)
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("connected", &self.is_connected())
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
