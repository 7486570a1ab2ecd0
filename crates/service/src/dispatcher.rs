//! The report/action dispatcher.
//!
//! Every report from either source funnels through [`Dispatcher::dispatch`]:
//! look up the active mapping table, execute the single matched action
//! against the right adapter, and treat a miss as a silent no-op. The
//! table reference is an atomically swapped snapshot, so dispatch never
//! observes a half-rebuilt table during a rebind.

use crate::session::ActiveMappings;
use flight_deck_core::{
    Action, DeviceAdapter, DeviceCommand, Report, SimulatorAdapter, Value,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a dispatch call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The matched action was executed.
    Executed,
    /// No mapping entry for the report; nothing happened.
    NoMapping,
    /// A value-writing action matched but neither the report nor the
    /// configuration supplied a value; nothing happened.
    MissingValue,
}

/// Routes reports to actions against the two adapter sides.
///
/// Device-targeted actions are applied to every attached device; a
/// captain and first-officer unit both follow the same brightness.
pub struct Dispatcher {
    mappings: ActiveMappings,
    devices: Vec<Arc<dyn DeviceAdapter>>,
    simulator: Arc<dyn SimulatorAdapter>,
}

impl Dispatcher {
    pub fn new(
        mappings: ActiveMappings,
        devices: Vec<Arc<dyn DeviceAdapter>>,
        simulator: Arc<dyn SimulatorAdapter>,
    ) -> Self {
        Self {
            mappings,
            devices,
            simulator,
        }
    }

    async fn apply_to_devices(&self, command: DeviceCommand) -> Result<()> {
        for device in &self.devices {
            device.apply(command.clone()).await?;
        }
        Ok(())
    }

    /// Match and execute a single report. At most one action runs, and it
    /// runs synchronously within this call.
    pub async fn dispatch(&self, report: &Report) -> Result<DispatchOutcome> {
        let key = report.key();
        let Some(table) = self.mappings.snapshot().await else {
            trace!(report = %key, "no active mapping table");
            return Ok(DispatchOutcome::NoMapping);
        };
        let Some(action) = table.lookup(key.kind, &key.name) else {
            debug!(report = %key, "no mapping entry");
            return Ok(DispatchOutcome::NoMapping);
        };

        match action {
            Action::ExecuteCommand { command } => {
                debug!(report = %key, command = %command, "executing simulator command");
                self.simulator.execute(command).await?;
            }
            Action::SetSimulatorValue {
                value_name,
                fixed_value,
            } => {
                let Some(value) = substituted_value(report, fixed_value.as_ref()) else {
                    debug!(report = %key, target = %value_name, "no value to write, skipping");
                    return Ok(DispatchOutcome::MissingValue);
                };
                debug!(report = %key, target = %value_name, %value, "writing simulator value");
                self.simulator.set_value(value_name, &value).await?;
            }
            Action::SetDeviceValue {
                value_name,
                fixed_value,
            } => {
                let Some(value) = substituted_value(report, fixed_value.as_ref()) else {
                    debug!(report = %key, target = %value_name, "no value to write, skipping");
                    return Ok(DispatchOutcome::MissingValue);
                };
                debug!(report = %key, target = %value_name, %value, "writing device value");
                self.apply_to_devices(DeviceCommand::SetValue {
                    name: value_name.clone(),
                    value,
                })
                .await?;
            }
            Action::SetDeviceLed { led_name, on } => {
                debug!(report = %key, led = %led_name, on = *on, "setting device LED");
                self.apply_to_devices(DeviceCommand::SetLed {
                    name: led_name.clone(),
                    on: *on,
                })
                .await?;
            }
            Action::RefreshDisplay => {
                debug!(report = %key, "refreshing display");
                self.apply_to_devices(DeviceCommand::RefreshDisplay).await?;
            }
        }
        Ok(DispatchOutcome::Executed)
    }
}

/// The report's carried value wins; a configured fixed value covers
/// valueless reports such as key presses.
fn substituted_value(report: &Report, fixed: Option<&Value>) -> Option<Value> {
    report.value().or(fixed).cloned()
}
