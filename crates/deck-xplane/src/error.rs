//! Simulator transport error types.

use thiserror::Error;

/// Errors raised by the X-Plane UDP adapter.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataref path `{path}` is not encodable: {reason}")]
    BadDataref { path: String, reason: &'static str },

    #[error("malformed {message_type} datagram: {reason}")]
    MalformedDatagram {
        message_type: &'static str,
        reason: &'static str,
    },

    #[error("no response from X-Plane at {address} after {attempts} attempts")]
    ConnectFailed { address: String, attempts: u32 },

    #[error("no X-Plane beacon received within {seconds}s")]
    BeaconTimeout { seconds: u64 },

    #[error("cannot write text value to `{name}`: dataref writes are numeric")]
    UnsupportedWrite { name: String },
}
