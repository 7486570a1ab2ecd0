//! Aircraft profiles and runtime identity matching.
//!
//! A profile declares which `(icao, author)` identities it serves, the
//! mapping documents to bind, optional variant overlays with their
//! declarative resolver rules, and the simulator subscriptions the
//! profile needs. The [`AircraftRegistry`] holds every registered profile
//! (built-ins plus extension directories) and resolves the simulator's
//! currently loaded aircraft to a profile and variant.

#![deny(static_mut_refs)]

pub mod identity;
pub mod profile;
pub mod registry;
pub mod variant;

pub use identity::AircraftIdentity;
pub use profile::{AircraftProfile, ProfileError};
pub use registry::{AircraftRegistry, ResolvedAircraft};
pub use variant::{SampleCondition, ValueSamples, VariantRule};
