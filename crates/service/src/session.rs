//! Session state and the shared active-mapping-table handle.
//!
//! The session is process-lifetime state owned by the coordinator: which
//! aircraft is bound, whether the binding is pinned, and where the
//! connection stands. Nothing here is persisted; a restart reconstructs
//! everything.

use crate::error::ServiceError;
use flight_deck_aircraft::AircraftIdentity;
use flight_deck_core::MappingTable;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Coordinator state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Initial state, nothing connected.
    Disconnected,
    /// Simulator connection attempt in progress.
    ConnectingSimulator,
    /// Simulator reachable and at least one supported device open.
    DevicesReady,
    /// Waiting for a recognized aircraft; mappings are inert.
    AircraftUnbound,
    /// An aircraft configuration is bound and mappings are live.
    AircraftBound,
    /// Unrecoverable adapter failure; terminal until process restart.
    Degraded,
}

impl SessionState {
    /// Whether `self -> to` is a legal transition.
    fn can_transition_to(self, to: SessionState) -> bool {
        use SessionState::*;
        // Degraded is reachable from anywhere and terminal.
        if to == Degraded {
            return self != Degraded;
        }
        matches!(
            (self, to),
            (Disconnected, ConnectingSimulator)
                | (ConnectingSimulator, DevicesReady)
                | (DevicesReady, AircraftUnbound)
                | (AircraftUnbound, AircraftBound)
                | (AircraftBound, AircraftUnbound)
                | (AircraftBound, AircraftBound)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Degraded
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::ConnectingSimulator => "connecting-simulator",
            SessionState::DevicesReady => "devices-ready",
            SessionState::AircraftUnbound => "aircraft-unbound",
            SessionState::AircraftBound => "aircraft-bound",
            SessionState::Degraded => "degraded",
        };
        f.write_str(name)
    }
}

/// The identity and variant currently bound, for logging and rebind
/// comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub identity: AircraftIdentity,
    pub variant: Option<String>,
}

/// Process-lifetime session state, owned by the coordinator.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    binding: Option<Binding>,
    pinned: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            binding: None,
            pinned: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Developer override: the binding no longer follows the simulator's
    /// reported aircraft.
    pub fn pin(&mut self) {
        self.pinned = true;
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Move the state machine, rejecting transitions the design does not
    /// allow (including any transition out of `Degraded`).
    pub fn transition(&mut self, to: SessionState) -> Result<(), ServiceError> {
        if !self.state.can_transition_to(to) {
            return Err(ServiceError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        info!(from = %self.state, to = %to, "session state");
        self.state = to;
        if to != SessionState::AircraftBound {
            self.binding = None;
        }
        Ok(())
    }

    /// Record the bound aircraft alongside an `AircraftBound` transition.
    pub fn bind(&mut self, binding: Binding) -> Result<(), ServiceError> {
        self.transition(SessionState::AircraftBound)?;
        info!(
            aircraft = %binding.identity,
            variant = binding.variant.as_deref().unwrap_or("base"),
            "aircraft bound"
        );
        self.binding = Some(binding);
        Ok(())
    }
}

/// Shared handle to the active mapping table.
///
/// Lookups clone an `Arc` snapshot, so a rebind in progress can never
/// expose a half-updated table; replacement swaps the whole snapshot
/// under the write lock.
#[derive(Debug, Clone, Default)]
pub struct ActiveMappings {
    inner: Arc<RwLock<Option<Arc<MappingTable>>>>,
}

impl ActiveMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current table snapshot, if an aircraft is bound.
    pub async fn snapshot(&self) -> Option<Arc<MappingTable>> {
        self.inner.read().await.clone()
    }

    /// Atomically replace the table on (re)bind.
    pub async fn replace(&self, table: MappingTable) {
        *self.inner.write().await = Some(Arc::new(table));
    }

    /// Drop every mapping; no stale action can fire afterwards.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(icao: &str, author: &str) -> Binding {
        Binding {
            identity: AircraftIdentity::new(icao, author),
            variant: None,
        }
    }

    #[test]
    fn startup_path_is_legal() {
        let mut session = Session::new();
        session.transition(SessionState::ConnectingSimulator).unwrap();
        session.transition(SessionState::DevicesReady).unwrap();
        session.transition(SessionState::AircraftUnbound).unwrap();
        session.bind(binding("A21N", "ToLiss")).unwrap();
        assert_eq!(session.state(), SessionState::AircraftBound);
        assert!(session.binding().is_some());
    }

    #[test]
    fn rebind_and_unbind_are_legal_from_bound() {
        let mut session = Session::new();
        session.transition(SessionState::ConnectingSimulator).unwrap();
        session.transition(SessionState::DevicesReady).unwrap();
        session.transition(SessionState::AircraftUnbound).unwrap();
        session.bind(binding("A21N", "ToLiss")).unwrap();

        // Bound -> Bound (aircraft change with a match).
        session.bind(binding("A333", "Laminar Research")).unwrap();
        assert_eq!(
            session.binding().map(|b| b.identity.icao.as_str()),
            Some("A333")
        );

        // Bound -> Unbound clears the binding.
        session.transition(SessionState::AircraftUnbound).unwrap();
        assert!(session.binding().is_none());
    }

    #[test]
    fn skipping_states_is_rejected() {
        let mut session = Session::new();
        let err = session.transition(SessionState::AircraftBound).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[test]
    fn degraded_is_reachable_from_anywhere_and_terminal() {
        let mut session = Session::new();
        session.transition(SessionState::Degraded).unwrap();
        assert!(session.state().is_terminal());
        assert!(session.transition(SessionState::Disconnected).is_err());
        assert!(session.transition(SessionState::Degraded).is_err());
    }

    #[test]
    fn pin_survives_transitions() {
        let mut session = Session::new();
        session.pin();
        session.transition(SessionState::ConnectingSimulator).unwrap();
        assert!(session.is_pinned());
    }

    #[tokio::test]
    async fn active_mappings_swap_is_whole_table() {
        use flight_deck_core::{Action, MappingTable, ReportKey, ReportKind};

        let mappings = ActiveMappings::new();
        assert!(mappings.snapshot().await.is_none());

        mappings
            .replace(MappingTable::build(
                vec![(
                    ReportKey::new(ReportKind::KeyPress, "LSK1L"),
                    Action::RefreshDisplay,
                )],
                Vec::new(),
                None,
            ))
            .await;

        let before = mappings.snapshot().await.unwrap();
        assert_eq!(before.len(), 1);

        // A snapshot taken before a swap keeps serving the old table.
        mappings.replace(MappingTable::empty()).await;
        assert_eq!(before.len(), 1);
        assert_eq!(mappings.snapshot().await.unwrap().len(), 0);

        mappings.clear().await;
        assert!(mappings.snapshot().await.is_none());
    }
}
