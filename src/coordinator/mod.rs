//! Recording coordinator (background worker)
//!
//! This module provides the `RecordingCoordinator` that manages:
//! - The session lifecycle: Idle → Starting → Active → Stopping → Idle
//! - The single relay connection and its teardown on stop/close/error
//! - The offscreen recorder, created at most once through the registry
//! - Forwarding chunks to the relay and relay replies to the overlay
//! - A published status snapshot, including the last error

mod config;
#[allow(clippy::module_inception)]
mod coordinator;
mod events;
mod state;

pub use config::CoordinatorConfig;
pub use coordinator::RecordingCoordinator;
pub use events::{ControlMessage, CoordinatorEvent, CoordinatorHandle, ToggleOutcome, Transition};
pub use state::{CoordinatorStatus, Session, SessionPhase};
