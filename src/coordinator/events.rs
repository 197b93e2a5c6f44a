use std::time::Duration;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::state::CoordinatorStatus;
use crate::error::PipelineError;
use crate::messages::UiMessage;
use crate::recorder::RecorderEvent;
use crate::relay::RelayEvent;

/// Requests to the coordinator from UI and timers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    Ui(UiMessage),
    /// Fired `stop_timeout` after a stop was requested
    StopTimeout { session_id: Uuid },
    Shutdown,
}

/// Everything the coordinator reacts to
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    Control(ControlMessage),
    Recorder(RecorderEvent),
    Relay(RelayEvent),
}

/// Result of a start/stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The transition began
    Requested,
    /// Preconditions did not hold; nothing was done
    Ignored,
}

/// Result of a toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Starting,
    Stopping,
    /// A transition is already in flight
    Busy,
    Failed(PipelineError),
}

/// Cloneable handle for UI code
#[derive(Clone)]
pub struct CoordinatorHandle {
    control: mpsc::Sender<ControlMessage>,
    status: watch::Receiver<CoordinatorStatus>,
}

impl CoordinatorHandle {
    pub(super) fn new(
        control: mpsc::Sender<ControlMessage>,
        status: watch::Receiver<CoordinatorStatus>,
    ) -> Self {
        Self { control, status }
    }

    /// Deliver a UI message (`TOGGLE_ECHO`)
    pub async fn send_ui(&self, message: UiMessage) -> bool {
        self.control.send(ControlMessage::Ui(message)).await.is_ok()
    }

    pub async fn toggle(&self) -> bool {
        self.send_ui(UiMessage::ToggleEcho).await
    }

    pub async fn shutdown(&self) -> bool {
        self.control.send(ControlMessage::Shutdown).await.is_ok()
    }

    /// Latest published status
    pub fn status(&self) -> CoordinatorStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorStatus> {
        self.status.clone()
    }

    /// Wait until the status satisfies `predicate`, up to `timeout`
    pub async fn wait_for<F>(&self, timeout: Duration, predicate: F) -> Option<CoordinatorStatus>
    where
        F: FnMut(&CoordinatorStatus) -> bool,
    {
        let mut rx = self.status.clone();
        let status = match tokio::time::timeout(timeout, rx.wait_for(predicate)).await {
            Ok(Ok(status)) => Some(status.clone()),
            _ => None,
        };
        status
    }
}
