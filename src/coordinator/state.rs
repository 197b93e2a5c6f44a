use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::platform::{CaptureHandle, TabId};
use crate::relay::{ConnectionState, RelayConnection};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Starting,
    Active,
    Stopping,
}

/// One user-initiated recording interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Unique session ID, carried on every chunk
    pub id: Uuid,

    /// Tab whose audio is captured
    pub target_tab: TabId,

    /// Capture handle resolved for the tab
    pub capture_handle: CaptureHandle,

    /// True between the recorder confirming start and the stop request
    pub active: bool,

    pub started_at: DateTime<Utc>,
}

/// Snapshot of the coordinator, published on every transition
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorStatus {
    pub phase: SessionPhase,

    /// A start or stop is in flight; toggles are rejected meanwhile
    pub transitioning: bool,

    pub session: Option<Session>,

    pub relay: ConnectionState,

    /// Most recent failure, cleared when a new start begins
    pub last_error: Option<PipelineError>,

    pub chunks_forwarded: u64,

    pub chunks_dropped: u64,
}

impl CoordinatorStatus {
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }
}

/// Mutable coordinator state; the session and relay slots hold at most one
/// value each
#[derive(Default)]
pub(super) struct CoordinatorState {
    pub phase: SessionPhase,
    pub transitioning: bool,
    pub session: Option<Session>,
    pub relay: Option<RelayConnection>,
    pub closing_relay: Option<ClosingRelay>,
    pub relay_connecting: bool,
    pub last_error: Option<PipelineError>,
    pub chunks_forwarded: u64,
    pub chunks_dropped: u64,
}

/// A relay connection closed by us whose replies are still accepted
#[derive(Debug, Clone, Copy)]
pub(super) struct ClosingRelay {
    pub generation: u64,
    pub deadline: Instant,
}

impl CoordinatorState {
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.active)
    }

    pub fn relay_state(&self) -> ConnectionState {
        match &self.relay {
            Some(relay) => relay.state(),
            None if self.relay_connecting => ConnectionState::Connecting,
            None => ConnectionState::Closed,
        }
    }

    pub fn snapshot(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            phase: self.phase,
            transitioning: self.transitioning,
            session: self.session.clone(),
            relay: self.relay_state(),
            last_error: self.last_error.clone(),
            chunks_forwarded: self.chunks_forwarded,
            chunks_dropped: self.chunks_dropped,
        }
    }
}
