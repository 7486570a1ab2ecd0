//! Service-level error types.

use crate::session::SessionState;
use thiserror::Error;

/// Errors raised by the coordinator and session state machine.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid session transition {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("no supported devices attached at startup")]
    NoDevices,

    #[error("simulator report stream ended")]
    SimulatorStreamEnded,

    #[error("device report stream ended")]
    DeviceStreamEnded,
}
