//! The session coordinator.
//!
//! Owns the state machine and the active mapping table. Startup walks
//! `Disconnected -> ConnectingSimulator -> DevicesReady ->
//! AircraftUnbound`; from there every aircraft-change report from the
//! simulator drives rebinds: a recognized identity (re)builds and
//! atomically swaps the mapping table, an unrecognized one clears it and
//! puts the devices into the fallback screen. A developer-pinned profile
//! disables rebinding entirely.
//!
//! The two report sources stay independent: device reads and simulator
//! reads each feed their own channel, and the coordinator's select loop
//! drains whichever has traffic, dispatching synchronously per report.

use crate::dispatcher::Dispatcher;
use crate::error::ServiceError;
use crate::session::{ActiveMappings, Binding, Session, SessionState};
use flight_deck_aircraft::{AircraftProfile, AircraftRegistry, ResolvedAircraft, ValueSamples};
use flight_deck_core::config::ConfigError;
use flight_deck_core::{
    DeviceAdapter, DeviceCommand, DeviceReport, MappingDocument, MappingLayer, MappingTable,
    Report, SimulatorAdapter, SimulatorReport, SimulatorReportKind, SimulatorReportReceiver,
    SubscriptionSet, ValueSubscription,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Shown on the devices while no recognized aircraft is loaded.
pub const FALLBACK_TEXT: &str = "waiting for aircraft...";

/// Identity datarefs, monitored for the whole session so aircraft
/// changes are always observed.
const ICAO_VALUE: &str = "sim/aircraft/view/acf_ICAO";
const AUTHOR_VALUE: &str = "sim/aircraft/view/acf_author";
const IDENTITY_TEXT_LEN: usize = 40;

const DEVICE_CHANNEL_CAPACITY: usize = 256;

/// Startup configuration consumed by the coordinator.
#[derive(Debug, Default)]
pub struct CoordinatorConfig {
    /// Device-default mapping document, lowest merge layer.
    pub device_defaults: MappingDocument,
    /// Developer override: bind this profile and ignore aircraft changes.
    pub pinned_profile: Option<AircraftProfile>,
}

enum Next {
    Simulator(Option<SimulatorReport>),
    Device(Option<DeviceReport>),
}

/// Owns the session, supervises the two report loops, and rebinds
/// mappings on aircraft change.
pub struct Coordinator {
    registry: AircraftRegistry,
    devices: Vec<Arc<dyn DeviceAdapter>>,
    simulator: Arc<dyn SimulatorAdapter>,
    mappings: ActiveMappings,
    dispatcher: Dispatcher,
    session: Session,
    device_defaults: MappingLayer,
    pinned_profile: Option<AircraftProfile>,
    samples: ValueSamples,
    icao: Option<String>,
    author: Option<String>,
    simulator_rx: Option<SimulatorReportReceiver>,
    device_rx: Option<mpsc::Receiver<DeviceReport>>,
}

impl Coordinator {
    /// Build a coordinator. The device-defaults document is compiled
    /// eagerly so a malformed one fails startup, not the first bind.
    pub fn new(
        registry: AircraftRegistry,
        devices: Vec<Arc<dyn DeviceAdapter>>,
        simulator: Arc<dyn SimulatorAdapter>,
        config: CoordinatorConfig,
    ) -> Result<Self, ConfigError> {
        let device_defaults = config.device_defaults.compile()?;
        let mappings = ActiveMappings::new();
        let dispatcher = Dispatcher::new(
            mappings.clone(),
            devices.clone(),
            Arc::clone(&simulator),
        );
        Ok(Self {
            registry,
            devices,
            simulator,
            mappings,
            dispatcher,
            session: Session::new(),
            device_defaults,
            pinned_profile: config.pinned_profile,
            samples: ValueSamples::new(),
            icao: None,
            author: None,
            simulator_rx: None,
            device_rx: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Subscriptions that hold for the whole session: the aircraft
    /// identity datarefs plus every registered profile's variant samples.
    fn base_subscriptions(&self) -> SubscriptionSet {
        let mut set = SubscriptionSet {
            values: vec![
                ValueSubscription::text(ICAO_VALUE, IDENTITY_TEXT_LEN),
                ValueSubscription::text(AUTHOR_VALUE, IDENTITY_TEXT_LEN),
            ],
            commands: Vec::new(),
        };
        set.extend(self.registry.all_sample_subscriptions());
        set
    }

    async fn apply_to_devices(&self, command: DeviceCommand) {
        for device in &self.devices {
            if let Err(err) = device.apply(command.clone()).await {
                warn!(
                    model = %device.descriptor().model,
                    error = %err,
                    "device command failed"
                );
            }
        }
    }

    /// Walk the startup transitions: subscribe to the simulator, start
    /// one report loop per attached device, and either show the fallback
    /// screen or bind the developer-pinned profile.
    pub async fn startup(&mut self) -> Result<()> {
        self.session.transition(SessionState::ConnectingSimulator)?;

        let simulator_rx = match self.simulator.subscribe(self.base_subscriptions()).await {
            Ok(rx) => rx,
            Err(err) => {
                self.session.transition(SessionState::Degraded)?;
                return Err(err);
            }
        };
        self.simulator_rx = Some(simulator_rx);

        if self.devices.is_empty() {
            self.session.transition(SessionState::Degraded)?;
            return Err(ServiceError::NoDevices.into());
        }
        self.session.transition(SessionState::DevicesReady)?;

        let (tx, rx) = mpsc::channel(DEVICE_CHANNEL_CAPACITY);
        for device in &self.devices {
            let mut reports = match device.start_reports().await {
                Ok(reports) => reports,
                Err(err) => {
                    self.session.transition(SessionState::Degraded)?;
                    return Err(err);
                }
            };
            let tx = tx.clone();
            let model = device.descriptor().model.clone();
            tokio::spawn(async move {
                while let Some(report) = reports.recv().await {
                    if tx.send(report).await.is_err() {
                        break;
                    }
                }
                debug!(model = %model, "device report loop ended");
            });
        }
        self.device_rx = Some(rx);
        self.session.transition(SessionState::AircraftUnbound)?;

        if let Some(profile) = self.pinned_profile.take() {
            info!(profile = %profile.name, "binding developer-pinned aircraft profile");
            self.bind_pinned(profile).await?;
        } else {
            self.apply_to_devices(DeviceCommand::ShowStatus {
                text: FALLBACK_TEXT.to_string(),
            })
            .await;
        }
        Ok(())
    }

    /// Drive both report loops until the process terminates or an
    /// adapter dies, which degrades the session.
    pub async fn run(&mut self) -> Result<()> {
        if self.session.state() == SessionState::Disconnected {
            self.startup().await?;
        }

        loop {
            let mut simulator_rx = self
                .simulator_rx
                .take()
                .ok_or(ServiceError::SimulatorStreamEnded)?;
            let mut device_rx = self
                .device_rx
                .take()
                .ok_or(ServiceError::DeviceStreamEnded)?;

            let next = tokio::select! {
                report = simulator_rx.recv() => Next::Simulator(report),
                report = device_rx.recv() => Next::Device(report),
            };
            self.simulator_rx = Some(simulator_rx);
            self.device_rx = Some(device_rx);

            let result = match next {
                Next::Simulator(Some(report)) => self.handle_simulator_report(report).await,
                Next::Device(Some(report)) => self.handle_device_report(report).await,
                Next::Simulator(None) => Err(ServiceError::SimulatorStreamEnded.into()),
                Next::Device(None) => Err(ServiceError::DeviceStreamEnded.into()),
            };
            if let Err(err) = result {
                warn!(error = %err, "unrecoverable failure, session degraded");
                let _ = self.session.transition(SessionState::Degraded);
                return Err(err);
            }
        }
    }

    /// Process one device report: straight to the dispatcher.
    pub async fn handle_device_report(&mut self, report: DeviceReport) -> Result<()> {
        self.dispatcher.dispatch(&Report::Device(report)).await?;
        Ok(())
    }

    /// Process one simulator report: track identity and variant samples,
    /// rebind when the aircraft changed, then dispatch.
    pub async fn handle_simulator_report(&mut self, report: SimulatorReport) -> Result<()> {
        if report.kind == SimulatorReportKind::SimulatorValueChange {
            if let Some(value) = &report.value {
                match report.name.as_str() {
                    ICAO_VALUE => {
                        self.icao = value.as_text().map(str::to_string);
                        self.maybe_rebind().await?;
                    }
                    AUTHOR_VALUE => {
                        self.author = value.as_text().map(str::to_string);
                        self.maybe_rebind().await?;
                    }
                    _ => {
                        self.samples.insert(report.name.clone(), value.clone());
                        // A sample change can move the same identity to a
                        // different variant.
                        self.maybe_rebind().await?;
                    }
                }
            }
        }
        self.dispatcher.dispatch(&Report::Simulator(report)).await?;
        Ok(())
    }

    /// React to the latest reported identity. Requires both identity
    /// halves; rebinding is disabled for pinned sessions.
    async fn maybe_rebind(&mut self) -> Result<()> {
        let (Some(icao), Some(author)) = (self.icao.clone(), self.author.clone()) else {
            return Ok(());
        };
        if !matches!(
            self.session.state(),
            SessionState::AircraftUnbound | SessionState::AircraftBound
        ) {
            return Ok(());
        }
        if self.session.is_pinned() {
            if let Some(binding) = self.session.binding()
                && (binding.identity.icao != icao || binding.identity.author != author)
            {
                warn!(
                    pinned = %binding.identity,
                    reported_icao = %icao,
                    reported_author = %author,
                    "aircraft discrepancy ignored: session uses a pinned configuration"
                );
            }
            return Ok(());
        }

        match self.registry.resolve(&icao, &author, &self.samples) {
            Some(resolved) => {
                let binding = Binding {
                    identity: resolved.identity.clone(),
                    variant: resolved.variant.clone(),
                };
                if self.session.binding() == Some(&binding) {
                    debug!(aircraft = %binding.identity, "same aircraft, no rebind");
                    return Ok(());
                }
                self.bind(resolved).await
            }
            None => {
                if self.session.state() == SessionState::AircraftBound {
                    info!(%icao, %author, "aircraft changed to an unregistered model, unbinding");
                    self.unbind().await
                } else {
                    warn!(%icao, %author, "waiting for a registered aircraft");
                    Ok(())
                }
            }
        }
    }

    /// Bind a resolved aircraft: swap the merged table in atomically,
    /// replace the simulator subscription set, and put the devices on the
    /// normal application screen.
    async fn bind(&mut self, resolved: ResolvedAircraft) -> Result<()> {
        let table = MappingTable::build(
            self.device_defaults.clone(),
            resolved.base_layer(),
            resolved.overlay_layer(),
        );
        info!(
            aircraft = %resolved.identity,
            variant = resolved.variant.as_deref().unwrap_or("base"),
            mappings = table.len(),
            "activating mapping table"
        );
        self.mappings.replace(table).await;

        let mut set = self.base_subscriptions();
        set.extend(resolved.subscriptions());
        self.simulator_rx = Some(self.simulator.subscribe(set).await?);

        self.apply_to_devices(DeviceCommand::ShowStatus {
            text: format!("{} ready", resolved.identity.icao),
        })
        .await;
        self.apply_to_devices(DeviceCommand::RefreshDisplay).await;

        self.session.bind(Binding {
            identity: resolved.identity,
            variant: resolved.variant,
        })?;
        Ok(())
    }

    /// Bind the developer-pinned profile using its first declared
    /// identity; variant resolution still runs against current samples.
    async fn bind_pinned(&mut self, profile: AircraftProfile) -> Result<()> {
        let mut registry = AircraftRegistry::new();
        let identity = profile
            .aircraft
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("pinned profile declares no aircraft"))?;
        registry.register(profile);
        let resolved = registry
            .resolve(&identity.icao, &identity.author, &self.samples)
            .ok_or_else(|| anyhow::anyhow!("pinned profile failed to resolve"))?;
        self.bind(resolved).await?;
        self.session.pin();
        Ok(())
    }

    /// Drop the binding: clear every mapping so no stale action can fire,
    /// fall back to the base subscription set, and show the fallback
    /// text.
    async fn unbind(&mut self) -> Result<()> {
        self.mappings.clear().await;
        self.simulator_rx = Some(self.simulator.subscribe(self.base_subscriptions()).await?);
        self.apply_to_devices(DeviceCommand::ShowStatus {
            text: FALLBACK_TEXT.to_string(),
        })
        .await;
        self.session.transition(SessionState::AircraftUnbound)?;
        Ok(())
    }
}
