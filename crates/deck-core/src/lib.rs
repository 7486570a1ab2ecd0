//! Core types for the OpenFlightDeck bridge.
//!
//! This crate holds the domain vocabulary shared by every other crate:
//! reports emitted by the hardware and the simulator, the actions a report
//! can trigger, the merged mapping tables that bind one to the other, the
//! declarative mapping-document schema, and the adapter traits concrete
//! device/simulator backends implement.
//!
//! ## Modules
//! - `report` - `Report`, `DeviceReport`, `SimulatorReport`, `Value`
//! - `action` - `Action` descriptors materialized from configuration
//! - `mapping` - `MappingTable` layered merge and lookup
//! - `config` - the kebab-case YAML mapping document schema
//! - `adapter` - `DeviceAdapter` / `SimulatorAdapter` seams

#![deny(static_mut_refs)]

pub mod action;
pub mod adapter;
pub mod config;
pub mod mapping;
pub mod report;

pub use action::Action;
pub use adapter::{
    DeviceAdapter, DeviceCommand, DeviceDescriptor, DeviceReportReceiver, SimulatorAdapter,
    SimulatorReportReceiver, SubscriptionSet, ValueKind, ValueSubscription,
};
pub use config::{ConfigError, MappingDocument, MappingEntry};
pub use mapping::{MappingLayer, MappingTable};
pub use report::{
    DeviceReport, DeviceReportKind, Report, ReportKey, ReportKind, SimulatorReport,
    SimulatorReportKind, Value,
};
