//! Adapter seams between the routing core and its collaborators.
//!
//! Concrete device backends (`flight-deck-devices`) and simulator
//! backends (`flight-deck-xplane`) implement these traits; the service
//! crate only ever talks to the trait objects, which keeps the dispatcher
//! and coordinator testable with hand-rolled mocks.

use crate::report::{DeviceReport, SimulatorReport, Value};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub type DeviceReportReceiver = mpsc::Receiver<DeviceReport>;
pub type SimulatorReportReceiver = mpsc::Receiver<SimulatorReport>;

/// Static identity of an attached device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub model: String,
}

impl DeviceDescriptor {
    pub fn new(vendor_id: u16, product_id: u16, model: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            model: model.into(),
        }
    }
}

/// A device-targeted instruction produced by the dispatcher or the
/// coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Set a device channel such as a backlight level.
    SetValue { name: String, value: Value },
    /// Turn an annunciator LED on or off.
    SetLed { name: String, on: bool },
    /// Redraw the display from the current page content.
    RefreshDisplay,
    /// Replace the display with a status message (e.g. the unbound
    /// fallback text).
    ShowStatus { text: String },
}

/// A hardware control-and-display unit.
///
/// `start_reports` may be called once per session; the returned channel
/// yields reports in arrival order until the device read loop dies with
/// the process.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    fn descriptor(&self) -> &DeviceDescriptor;

    /// Start the blocking read loop and return its report stream.
    async fn start_reports(&self) -> Result<DeviceReportReceiver>;

    /// Apply a device-targeted command.
    async fn apply(&self, command: DeviceCommand) -> Result<()>;
}

/// How a subscribed simulator value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A numeric dataref.
    Number,
    /// A character-array dataref of at most `len` bytes, reassembled into
    /// a text value.
    Text { len: usize },
}

/// One subscribed simulator value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSubscription {
    pub name: String,
    pub kind: ValueKind,
}

impl ValueSubscription {
    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Number,
        }
    }

    pub fn text(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Text { len },
        }
    }
}

/// The set of simulator values and commands a session monitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    pub values: Vec<ValueSubscription>,
    pub commands: Vec<String>,
}

impl SubscriptionSet {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.commands.is_empty()
    }

    /// Append another set, skipping names already present.
    pub fn extend(&mut self, other: SubscriptionSet) {
        for value in other.values {
            if !self.values.iter().any(|v| v.name == value.name) {
                self.values.push(value);
            }
        }
        for command in other.commands {
            if !self.commands.contains(&command) {
                self.commands.push(command);
            }
        }
    }
}

/// The flight simulator's live data/command interface.
#[async_trait]
pub trait SimulatorAdapter: Send + Sync {
    /// Replace the active subscription set and return the report stream
    /// for it. Called on every aircraft (re)bind.
    async fn subscribe(&self, set: SubscriptionSet) -> Result<SimulatorReportReceiver>;

    /// Execute a simulator command.
    async fn execute(&self, command: &str) -> Result<()>;

    /// Write a simulator value.
    async fn set_value(&self, name: &str, value: &Value) -> Result<()>;
}
