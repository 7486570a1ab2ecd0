//! WinWing MCDU support: protocol, display model, and the device adapter.

pub mod adapter;
pub mod display;
pub mod protocol;

pub use adapter::McduAdapter;
pub use display::{Color, Page, PAGE_COLUMNS, PAGE_LINES};

use flight_deck_core::MappingDocument;

const DEFAULT_MAPPINGS_YAML: &str = include_str!("default_mappings.yaml");

/// Device-default mapping document merged below every aircraft's own
/// mappings.
pub fn default_mappings() -> MappingDocument {
    // The embedded document is covered by tests; an empty fallback keeps
    // a corrupted build from panicking at startup.
    MappingDocument::from_yaml(DEFAULT_MAPPINGS_YAML).unwrap_or_default()
}
