//! flightdeck - bridge WinWing flight-deck hardware to X-Plane.
//!
//! Connects attached MCDU units to a running simulator, translating key
//! presses into simulator commands and simulator state into display, LED,
//! and backlight updates, with aircraft-specific bindings resolved at
//! runtime.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flight_deck_aircraft::{AircraftProfile, AircraftRegistry};
use flight_deck_core::DeviceAdapter;
use flight_deck_devices::{DeviceCatalog, mcdu};
use flight_deck_service::{Coordinator, CoordinatorConfig};
use flight_deck_xplane::{ConnectPolicy, XPlaneAdapter, discover};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BEACON_WAIT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "flightdeck")]
#[command(about = "Bridge WinWing flight-deck hardware to X-Plane")]
#[command(version)]
struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (default)
    Run(RunArgs),

    /// List attached WinWing devices
    Devices {
        /// List every HID device on the system
        #[arg(short, long)]
        all: bool,
    },

    /// List registered aircraft profiles
    Aircraft {
        /// Additional profile directories to scan
        #[arg(short, long = "extension", value_name = "DIR")]
        extensions: Vec<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Host name or address of the X-Plane UDP interface
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// UDP port of the X-Plane interface
    #[arg(long, default_value_t = 49000)]
    port: u16,

    /// Discover the simulator via its multicast beacon instead of
    /// host/port
    #[arg(long, conflicts_with_all = ["host", "port"])]
    beacon: bool,

    /// Pin the session to this aircraft profile file (developer
    /// override; aircraft changes in the simulator are ignored)
    #[arg(long, value_name = "FILE")]
    aircraft: Option<PathBuf>,

    /// Additional profile directories to scan at startup
    #[arg(short, long = "extension", value_name = "DIR")]
    extensions: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("flightdeck={log_level},flight_deck={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command.unwrap_or(Commands::Run(RunArgs {
        host: "127.0.0.1".to_string(),
        port: 49000,
        beacon: false,
        aircraft: None,
        extensions: Vec::new(),
    })) {
        Commands::Run(args) => run(args).await,
        Commands::Devices { all } => list_devices(all),
        Commands::Aircraft { extensions } => list_aircraft(&extensions),
    }
}

fn build_registry(extensions: &[PathBuf]) -> AircraftRegistry {
    let mut registry = AircraftRegistry::with_builtins();
    for dir in extensions {
        registry.load_extension_dir(dir);
    }
    registry
}

fn resolve_address(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("cannot resolve {host}:{port}"))?
        .next()
        .with_context(|| format!("no address for {host}:{port}"))
}

async fn run(args: RunArgs) -> Result<()> {
    let registry = build_registry(&args.extensions);

    let pinned_profile = match &args.aircraft {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read aircraft profile {}", path.display()))?;
            let profile = AircraftProfile::from_yaml(&source)
                .with_context(|| format!("invalid aircraft profile {}", path.display()))?;
            Some(profile)
        }
        None => None,
    };

    let address = if args.beacon {
        discover(BEACON_WAIT).await?
    } else {
        resolve_address(&args.host, args.port)?
    };

    let simulator = XPlaneAdapter::connect(address, ConnectPolicy::default()).await?;

    let devices = DeviceCatalog::open_attached()?;
    if devices.is_empty() {
        bail!("no supported WinWing device detected");
    }
    for device in &devices {
        device.initialize().await?;
    }
    let devices: Vec<Arc<dyn DeviceAdapter>> = devices
        .into_iter()
        .map(|device| device as Arc<dyn DeviceAdapter>)
        .collect();

    let mut coordinator = Coordinator::new(
        registry,
        devices,
        Arc::new(simulator),
        CoordinatorConfig {
            device_defaults: mcdu::default_mappings(),
            pinned_profile,
        },
    )?;
    coordinator.run().await
}

fn list_devices(all: bool) -> Result<()> {
    let devices = DeviceCatalog::list_attached(all)?;
    if devices.is_empty() {
        println!("no WinWing device detected");
        return Ok(());
    }
    for device in devices {
        let support = if device.supported {
            DeviceCatalog::model(device.vendor_id, device.product_id).unwrap_or("supported")
        } else {
            "unsupported"
        };
        println!(
            "{:#06x}:{:#06x}  {:<32}  {}",
            device.vendor_id, device.product_id, device.product, support
        );
    }
    Ok(())
}

fn list_aircraft(extensions: &[PathBuf]) -> Result<()> {
    let registry = build_registry(extensions);
    for key in registry.identity_keys() {
        println!("{key}");
    }
    Ok(())
}
