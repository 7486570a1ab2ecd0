//! Actions a matched report triggers.
//!
//! Actions are immutable descriptors materialized from configuration. The
//! only runtime influence a report has on its action is value
//! substitution: the two value-carrying kinds receive the report's value
//! (or a fixed value from configuration when the report carries none).

use crate::report::Value;
use std::fmt;

/// A configured response to a report.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Execute a simulator command, e.g. `AirbusFBW/MCDU1LSK1L`.
    ExecuteCommand { command: String },
    /// Write a value to a simulator dataref.
    SetSimulatorValue {
        value_name: String,
        /// Fixed value used when the triggering report carries none.
        fixed_value: Option<Value>,
    },
    /// Write a value to a device channel (e.g. a backlight level).
    SetDeviceValue {
        value_name: String,
        fixed_value: Option<Value>,
    },
    /// Turn a device LED on or off.
    SetDeviceLed { led_name: String, on: bool },
    /// Redraw the device display from current state.
    RefreshDisplay,
}

impl Action {
    /// Whether this action kind consumes a value from the matched report.
    pub fn takes_report_value(&self) -> bool {
        matches!(
            self,
            Action::SetSimulatorValue { .. } | Action::SetDeviceValue { .. }
        )
    }

    /// Whether this action targets the device (as opposed to the simulator).
    pub fn targets_device(&self) -> bool {
        matches!(
            self,
            Action::SetDeviceValue { .. } | Action::SetDeviceLed { .. } | Action::RefreshDisplay
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ExecuteCommand { command } => {
                write!(f, "execute-simulator-command {command}")
            }
            Action::SetSimulatorValue { value_name, .. } => {
                write!(f, "set-simulator-value {value_name}")
            }
            Action::SetDeviceValue { value_name, .. } => {
                write!(f, "set-device-value {value_name}")
            }
            Action::SetDeviceLed { led_name, on } => {
                write!(f, "set-device-led {led_name} {}", if *on { "on" } else { "off" })
            }
            Action::RefreshDisplay => f.write_str("refresh-display"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_substitution_only_for_value_kinds() {
        assert!(
            Action::SetSimulatorValue {
                value_name: "sim/cockpit/electrical/instrument_brightness".into(),
                fixed_value: None,
            }
            .takes_report_value()
        );
        assert!(
            Action::SetDeviceValue {
                value_name: "Backlight".into(),
                fixed_value: None,
            }
            .takes_report_value()
        );
        assert!(
            !Action::ExecuteCommand {
                command: "AirbusFBW/MCDU1LSK1L".into()
            }
            .takes_report_value()
        );
        assert!(!Action::RefreshDisplay.takes_report_value());
        assert!(
            !Action::SetDeviceLed {
                led_name: "FAIL".into(),
                on: true
            }
            .takes_report_value()
        );
    }

    #[test]
    fn target_split_matches_action_kind() {
        assert!(
            Action::SetDeviceLed {
                led_name: "RDY".into(),
                on: false
            }
            .targets_device()
        );
        assert!(Action::RefreshDisplay.targets_device());
        assert!(
            !Action::ExecuteCommand {
                command: "sim/FMS/ls_1l".into()
            }
            .targets_device()
        );
    }
}
