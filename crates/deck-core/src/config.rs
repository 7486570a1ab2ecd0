//! Declarative mapping document schema.
//!
//! A mapping document is a YAML file with two top-level lists,
//! `device-reports` and `simulator-reports`. Each entry names a report
//! type, the key/value/command the report refers to, an action, and the
//! action's parameter fields:
//!
//! ```yaml
//! device-reports:
//!   - report-type: key-press
//!     key-name: LSK1L
//!     action: execute-simulator-command
//!     simulator-command-name: AirbusFBW/MCDU1LSK1L
//! simulator-reports:
//!   - report-type: simulator-value-change
//!     simulator-value-name: AirbusFBW/PanelBrightnessLevel
//!     action: set-device-value
//!     device-value-name: Backlight
//! ```
//!
//! Documents are parsed once per (device, aircraft, variant) combination
//! and compiled into [`MappingLayer`]s; the hot dispatch path only ever
//! sees the merged [`crate::MappingTable`].

use crate::action::Action;
use crate::mapping::MappingLayer;
use crate::report::{ReportKey, ReportKind, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or compiling a mapping document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mapping document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("entry {index} in `{section}`: missing field `{field}` for {context}")]
    MissingField {
        section: &'static str,
        index: usize,
        field: &'static str,
        context: &'static str,
    },

    #[error("entry {index} in `{section}`: report type `{report_type}` does not belong in this section")]
    WrongSection {
        section: &'static str,
        index: usize,
        report_type: ReportKind,
    },
}

/// Action kinds as they appear in mapping documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    ExecuteSimulatorCommand,
    SetSimulatorValue,
    SetDeviceValue,
    SetDeviceLed,
    RefreshDisplay,
}

/// One configured mapping entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MappingEntry {
    pub report_type: ReportKind,
    pub action: ActionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_value_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator_value_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator_command_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_led_name: Option<String>,

    /// Fixed value for value-writing actions triggered by valueless
    /// reports (e.g. a key press setting a brightness level).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// LED state for `set-device-led`; defaults to on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_state: Option<bool>,
}

impl MappingEntry {
    /// The field naming what the report refers to, per report type.
    fn report_name(&self) -> (&'static str, Option<&String>) {
        match self.report_type {
            ReportKind::KeyPress => ("key-name", self.key_name.as_ref()),
            ReportKind::DeviceValueChange => {
                ("device-value-name", self.device_value_name.as_ref())
            }
            ReportKind::SimulatorValueChange => {
                ("simulator-value-name", self.simulator_value_name.as_ref())
            }
            ReportKind::CommandActive => {
                ("simulator-command-name", self.simulator_command_name.as_ref())
            }
        }
    }

    fn compile(
        &self,
        section: &'static str,
        index: usize,
    ) -> Result<(ReportKey, Action), ConfigError> {
        let missing = |field: &'static str, context: &'static str| ConfigError::MissingField {
            section,
            index,
            field,
            context,
        };

        let (name_field, name) = self.report_name();
        let name = name.ok_or_else(|| missing(name_field, "report name"))?;
        let key = ReportKey::new(self.report_type, name.clone());

        let action = match self.action {
            ActionKind::ExecuteSimulatorCommand => Action::ExecuteCommand {
                command: self
                    .simulator_command_name
                    .clone()
                    .ok_or_else(|| missing("simulator-command-name", "execute-simulator-command"))?,
            },
            ActionKind::SetSimulatorValue => Action::SetSimulatorValue {
                value_name: self
                    .simulator_value_name
                    .clone()
                    .ok_or_else(|| missing("simulator-value-name", "set-simulator-value"))?,
                fixed_value: self.value.clone(),
            },
            ActionKind::SetDeviceValue => Action::SetDeviceValue {
                value_name: self
                    .device_value_name
                    .clone()
                    .ok_or_else(|| missing("device-value-name", "set-device-value"))?,
                fixed_value: self.value.clone(),
            },
            ActionKind::SetDeviceLed => Action::SetDeviceLed {
                led_name: self
                    .device_led_name
                    .clone()
                    .ok_or_else(|| missing("device-led-name", "set-device-led"))?,
                on: self.led_state.unwrap_or(true),
            },
            ActionKind::RefreshDisplay => Action::RefreshDisplay,
        };

        Ok((key, action))
    }
}

/// A full mapping document: device-originated and simulator-originated
/// report bindings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MappingDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_reports: Vec<MappingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub simulator_reports: Vec<MappingEntry>,
}

impl MappingDocument {
    /// Parse a YAML mapping document.
    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Compile the document into one ordered mapping layer, validating
    /// that every entry carries the fields its report type and action
    /// require and sits in the right section.
    pub fn compile(&self) -> Result<MappingLayer, ConfigError> {
        let mut layer = Vec::with_capacity(self.device_reports.len() + self.simulator_reports.len());

        for (index, entry) in self.device_reports.iter().enumerate() {
            if !matches!(
                entry.report_type,
                ReportKind::KeyPress | ReportKind::DeviceValueChange
            ) {
                return Err(ConfigError::WrongSection {
                    section: "device-reports",
                    index,
                    report_type: entry.report_type,
                });
            }
            layer.push(entry.compile("device-reports", index)?);
        }

        for (index, entry) in self.simulator_reports.iter().enumerate() {
            if !matches!(
                entry.report_type,
                ReportKind::SimulatorValueChange | ReportKind::CommandActive
            ) {
                return Err(ConfigError::WrongSection {
                    section: "simulator-reports",
                    index,
                    report_type: entry.report_type,
                });
            }
            layer.push(entry.compile("simulator-reports", index)?);
        }

        Ok(layer)
    }

    /// Simulator value names this document's simulator-side entries react
    /// to; the coordinator subscribes these on bind.
    pub fn simulator_value_names(&self) -> Vec<String> {
        self.simulator_reports
            .iter()
            .filter(|e| e.report_type == ReportKind::SimulatorValueChange)
            .filter_map(|e| e.simulator_value_name.clone())
            .collect()
    }

    /// Command names watched for command-active reports.
    pub fn watched_command_names(&self) -> Vec<String> {
        self.simulator_reports
            .iter()
            .filter(|e| e.report_type == ReportKind::CommandActive)
            .filter_map(|e| e.simulator_command_name.clone())
            .collect()
    }
}
