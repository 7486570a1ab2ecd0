//! Report routing and aircraft-binding coordination.
//!
//! This crate is the center of the bridge: the [`Dispatcher`] matches
//! incoming reports against the active mapping table and executes the
//! configured actions, and the [`Coordinator`] owns the session state
//! machine, rebuilding and atomically swapping that table whenever the
//! simulator's loaded aircraft changes.

#![deny(static_mut_refs)]

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod session;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::ServiceError;
pub use session::{ActiveMappings, Session, SessionState};
