//! X-Plane simulator adapter.
//!
//! Talks the simulator's UDP interface: `RREF` dataref subscriptions,
//! `DREF` dataref writes, `CMND` command execution, and `BECN` multicast
//! beacon discovery. The [`XPlaneAdapter`] implements
//! [`flight_deck_core::SimulatorAdapter`] on top of these codecs with a
//! bounded-retry connection policy.

#![deny(static_mut_refs)]

pub mod adapter;
pub mod beacon;
pub mod error;
pub mod protocol;

pub use adapter::{ConnectPolicy, XPlaneAdapter};
pub use beacon::discover;
pub use error::SimulatorError;
