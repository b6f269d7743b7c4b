//! Transport-level error taxonomy shared by the bridge traits.

use core::fmt;
use std::io;

/// Failure modes of the native serial driver, surfaced as typed results.
///
/// The session never retries these; they propagate to whoever triggered the
/// connect/send/read. Timeouts are not represented here at all - the wait
/// primitives return `None` for those so poll loops can continue.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying driver I/O failure.
    Io(io::Error),
    /// Operation attempted on a closed or stale handle.
    InvalidHandle,
    /// No attached device matches the requested serial number.
    DeviceNotFound {
        /// Serial number that failed to resolve.
        serial_number: String,
    },
    /// Driver failure outside the documented error codes.
    General(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "driver I/O error: {err}"),
            Self::InvalidHandle => write!(f, "invalid device handle"),
            Self::DeviceNotFound { serial_number } => {
                write!(f, "device {serial_number} not found")
            }
            Self::General(msg) => write!(f, "driver error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
