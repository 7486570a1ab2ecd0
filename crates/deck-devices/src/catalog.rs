//! Supported-device catalog and HID enumeration.
//!
//! Devices are enumerated exactly once at startup. Units with the
//! WinWing vendor id but no registered model are skipped with a warning
//! and the remaining devices continue normally.

use crate::error::DeviceError;
use crate::mcdu::McduAdapter;
use crate::mcdu::protocol::{VENDOR_WINWING, product_ids};
use flight_deck_core::DeviceDescriptor;
use hidapi::HidApi;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Registered models: (vendor, product, model name).
const SUPPORTED_DEVICES: &[(u16, u16, &str)] = &[
    (VENDOR_WINWING, product_ids::MCDU_CAPTAIN, "MCDU (Captain)"),
    (
        VENDOR_WINWING,
        product_ids::MCDU_FIRST_OFFICER,
        "MCDU (First Officer)",
    ),
    (VENDOR_WINWING, product_ids::MCDU_OBSERVER, "MCDU (Observer)"),
];

/// A device seen during enumeration, whether or not it is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: String,
    pub supported: bool,
}

/// Catalog of supported flight-deck units.
#[derive(Debug, Default)]
pub struct DeviceCatalog;

impl DeviceCatalog {
    /// Model name for a supported `(vendor, product)` pair.
    pub fn model(vendor_id: u16, product_id: u16) -> Option<&'static str> {
        SUPPORTED_DEVICES
            .iter()
            .find(|(vid, pid, _)| *vid == vendor_id && *pid == product_id)
            .map(|(_, _, model)| *model)
    }

    /// List attached WinWing devices without opening them. With
    /// `include_all`, every HID device on the system is listed.
    pub fn list_attached(include_all: bool) -> Result<Vec<EnumeratedDevice>, DeviceError> {
        let api = HidApi::new()?;
        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for info in api.device_list() {
            if !include_all && info.vendor_id() != VENDOR_WINWING {
                continue;
            }
            if !seen.insert((info.vendor_id(), info.product_id())) {
                continue;
            }
            devices.push(EnumeratedDevice {
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                product: info.product_string().unwrap_or("<unknown>").to_string(),
                supported: Self::model(info.vendor_id(), info.product_id()).is_some(),
            });
        }
        Ok(devices)
    }

    /// Open every supported attached device. Unsupported WinWing units
    /// are skipped with a warning; a supported unit that fails to open is
    /// an error, since the session cannot safely drive half-open
    /// hardware.
    pub fn open_attached() -> Result<Vec<Arc<McduAdapter>>, DeviceError> {
        let api = HidApi::new()?;
        let mut seen = HashSet::new();
        let mut adapters: Vec<Arc<McduAdapter>> = Vec::new();

        for info in api.device_list() {
            if info.vendor_id() != VENDOR_WINWING {
                continue;
            }
            if !seen.insert((info.vendor_id(), info.product_id())) {
                continue;
            }
            let Some(model) = Self::model(info.vendor_id(), info.product_id()) else {
                warn!(
                    vendor_id = format_args!("{:#06x}", info.vendor_id()),
                    product_id = format_args!("{:#06x}", info.product_id()),
                    "no device handler for HID device, skipping"
                );
                continue;
            };

            let device = api.open(info.vendor_id(), info.product_id())?;
            let descriptor = DeviceDescriptor::new(info.vendor_id(), info.product_id(), model);
            info!(model, "device connected");
            adapters.push(Arc::new(McduAdapter::new(descriptor, device)));
        }

        Ok(adapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_three_mcdu_units_are_supported() {
        assert_eq!(
            DeviceCatalog::model(VENDOR_WINWING, product_ids::MCDU_CAPTAIN),
            Some("MCDU (Captain)")
        );
        assert_eq!(
            DeviceCatalog::model(VENDOR_WINWING, product_ids::MCDU_FIRST_OFFICER),
            Some("MCDU (First Officer)")
        );
        assert_eq!(
            DeviceCatalog::model(VENDOR_WINWING, product_ids::MCDU_OBSERVER),
            Some("MCDU (Observer)")
        );
    }

    #[test]
    fn unknown_product_is_unsupported() {
        assert_eq!(DeviceCatalog::model(VENDOR_WINWING, 0x0001), None);
        assert_eq!(DeviceCatalog::model(0x1234, product_ids::MCDU_CAPTAIN), None);
    }
}
