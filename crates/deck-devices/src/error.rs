//! Device and hardware error types.

use thiserror::Error;

/// Errors raised by device enumeration, I/O, and protocol handling.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("unsupported device: vendor={vendor_id:#06x}, product={product_id:#06x}")]
    UnsupportedDevice { vendor_id: u16, product_id: u16 },

    #[error("invalid input report from {model}: expected {expected} bytes, got {actual}")]
    InvalidReport {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown device value channel `{0}`")]
    UnknownValueChannel(String),

    #[error("unknown device LED `{0}`")]
    UnknownLed(String),

    #[error("device {model} disconnected")]
    Disconnected { model: String },
}
