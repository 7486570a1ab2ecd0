//! WinWing flight-deck device support.
//!
//! This crate implements the device side of the bridge: a catalog of
//! supported HID units, the MCDU wire protocol (input reports, LED and
//! brightness control frames, chunked display frames), and the
//! [`flight_deck_core::DeviceAdapter`] implementation that turns raw HID
//! traffic into device reports and applies device commands.

#![deny(static_mut_refs)]

pub mod catalog;
pub mod error;
pub mod mcdu;

pub use catalog::{DeviceCatalog, EnumeratedDevice};
pub use error::DeviceError;
pub use mcdu::McduAdapter;
