//! Protocol error types

use thiserror::Error;

/// Errors raised while decoding APT frames.
///
/// Protocol anomalies are kept separate from transport I/O failures: a
/// decode-size mismatch is never reported as an I/O error, and a reply that
/// simply failed to arrive in time is not an error at all (the session waits
/// return `None` for that).
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Buffer length does not match the fixed layout of the expected message
    #[error("malformed {message} frame: expected {expected} bytes, got {got}")]
    MalformedMessage {
        /// Name of the expected message structure
        message: &'static str,
        /// Byte size of the fixed layout
        expected: usize,
        /// Actual buffer length
        got: usize,
    },

    /// Fewer than six bytes supplied where a header was expected
    #[error("truncated header: need 6 bytes, got {got}")]
    TruncatedHeader {
        /// Actual buffer length
        got: usize,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
