//! Reports emitted by the hardware device and by the simulator.
//!
//! A report carries a kind, a name identifying the key/value/command it
//! refers to, and an optional value. Reports are produced once by an
//! adapter loop and consumed once by the dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value carried by a report or written to a target.
///
/// Simulator datarefs are numeric or character-array backed; device values
/// (brightness channels) are numeric. Text shows up for identity datarefs
/// such as the loaded aircraft's ICAO code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Text view of the value, if it has one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Text(s) => Some(s.as_str()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Report kinds a hardware device produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceReportKind {
    /// A key was pressed.
    KeyPress,
    /// A device-side value changed (e.g. an ambient light sensor).
    DeviceValueChange,
}

/// Report kinds the simulator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulatorReportKind {
    /// A subscribed simulator value changed.
    SimulatorValueChange,
    /// A subscribed command became active.
    CommandActive,
}

/// Flattened report kind used as half of a mapping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    KeyPress,
    DeviceValueChange,
    SimulatorValueChange,
    CommandActive,
}

impl From<DeviceReportKind> for ReportKind {
    fn from(kind: DeviceReportKind) -> Self {
        match kind {
            DeviceReportKind::KeyPress => ReportKind::KeyPress,
            DeviceReportKind::DeviceValueChange => ReportKind::DeviceValueChange,
        }
    }
}

impl From<SimulatorReportKind> for ReportKind {
    fn from(kind: SimulatorReportKind) -> Self {
        match kind {
            SimulatorReportKind::SimulatorValueChange => ReportKind::SimulatorValueChange,
            SimulatorReportKind::CommandActive => ReportKind::CommandActive,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::KeyPress => "key-press",
            ReportKind::DeviceValueChange => "device-value-change",
            ReportKind::SimulatorValueChange => "simulator-value-change",
            ReportKind::CommandActive => "command-active",
        };
        f.write_str(name)
    }
}

/// Exact-match lookup key for a mapping table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub kind: ReportKind,
    pub name: String,
}

impl ReportKey {
    pub fn new(kind: ReportKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A report produced by a hardware device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub kind: DeviceReportKind,
    pub name: String,
    pub value: Option<Value>,
}

impl DeviceReport {
    /// A key-press report for the named key.
    pub fn key_press(name: impl Into<String>) -> Self {
        Self {
            kind: DeviceReportKind::KeyPress,
            name: name.into(),
            value: None,
        }
    }

    /// A device value change carrying the new value.
    pub fn value_change(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: DeviceReportKind::DeviceValueChange,
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn key(&self) -> ReportKey {
        ReportKey::new(self.kind.into(), self.name.clone())
    }
}

/// A report produced by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorReport {
    pub kind: SimulatorReportKind,
    pub name: String,
    pub value: Option<Value>,
}

impl SimulatorReport {
    /// A value-change report carrying the new value.
    pub fn value_change(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: SimulatorReportKind::SimulatorValueChange,
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A command-active report for the named command.
    pub fn command_active(name: impl Into<String>) -> Self {
        Self {
            kind: SimulatorReportKind::CommandActive,
            name: name.into(),
            value: None,
        }
    }

    pub fn key(&self) -> ReportKey {
        ReportKey::new(self.kind.into(), self.name.clone())
    }
}

/// A report from either source, as seen by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Device(DeviceReport),
    Simulator(SimulatorReport),
}

impl Report {
    pub fn key(&self) -> ReportKey {
        match self {
            Report::Device(r) => r.key(),
            Report::Simulator(r) => r.key(),
        }
    }

    /// The value carried by the report, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Report::Device(r) => r.value.as_ref(),
            Report::Simulator(r) => r.value.as_ref(),
        }
    }
}

impl From<DeviceReport> for Report {
    fn from(report: DeviceReport) -> Self {
        Report::Device(report)
    }
}

impl From<SimulatorReport> for Report {
    fn from(report: SimulatorReport) -> Self {
        Report::Simulator(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_report_has_no_value() {
        let report = DeviceReport::key_press("LSK1L");
        assert_eq!(report.kind, DeviceReportKind::KeyPress);
        assert!(report.value.is_none());
    }

    #[test]
    fn report_key_flattens_source_kind() {
        let device = Report::from(DeviceReport::key_press("LSK1L"));
        assert_eq!(device.key(), ReportKey::new(ReportKind::KeyPress, "LSK1L"));

        let simulator = Report::from(SimulatorReport::value_change(
            "AirbusFBW/PanelBrightnessLevel",
            0.8,
        ));
        assert_eq!(
            simulator.key(),
            ReportKey::new(
                ReportKind::SimulatorValueChange,
                "AirbusFBW/PanelBrightnessLevel"
            )
        );
    }

    #[test]
    fn report_keys_are_case_sensitive() {
        let a = ReportKey::new(ReportKind::KeyPress, "LSK1L");
        let b = ReportKey::new(ReportKind::KeyPress, "lsk1l");
        assert_ne!(a, b);
    }

    #[test]
    fn value_views() {
        assert_eq!(Value::Number(0.8).as_number(), Some(0.8));
        assert_eq!(Value::Number(0.8).as_text(), None);
        assert_eq!(Value::Text("A21N".into()).as_text(), Some("A21N"));
    }

    #[test]
    fn value_deserializes_untagged() {
        let number: Value = serde_yaml::from_str("0.5").unwrap();
        assert_eq!(number, Value::Number(0.5));
        let text: Value = serde_yaml::from_str("\"hello\"").unwrap();
        assert_eq!(text, Value::Text("hello".into()));
    }
}
