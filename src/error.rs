use thiserror::Error;

/// Errors raised along the capture-and-relay pipeline.
///
/// Variants fall into three groups: permission/resolution failures that abort
/// a start attempt, transport failures on the relay socket, and protocol
/// misuse between the coordinator and the offscreen recorder.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No tab is currently active, so there is nothing to capture.
    #[error("No active tab to capture")]
    NoActiveTab,

    /// The platform refused to hand out a capture handle for the tab.
    #[error("Tab capture denied for tab {tab_id}: {reason}")]
    CaptureDenied {
        /// Tab that was being captured.
        tab_id: u64,
        /// Platform supplied reason.
        reason: String,
    },

    /// The media device behind a capture handle could not be opened.
    #[error("Media device unavailable: {reason}")]
    DeviceUnavailable {
        /// Platform supplied reason.
        reason: String,
    },

    /// Opening the relay socket failed.
    #[error("Failed to connect to relay at {url}: {reason}")]
    RelayConnect {
        /// Relay endpoint URL.
        url: String,
        /// Transport error text.
        reason: String,
    },

    /// The relay socket was closed by the remote side.
    #[error("Relay connection closed")]
    RelayClosed,

    /// The relay socket reported an error.
    #[error("Relay transport error: {reason}")]
    RelayTransport {
        /// Transport error text.
        reason: String,
    },

    /// `start-recording` arrived while a recorder is already recording.
    #[error("Called start-recording while recording is in progress")]
    AlreadyRecording,

    /// `stop-recording` arrived with no active recorder.
    #[error("Called stop-recording with no active recorder")]
    NotRecording,

    /// A command with an unrecognized type reached the recorder.
    #[error("Unrecognized command: {command}")]
    UnknownCommand {
        /// The raw command type.
        command: String,
    },

    /// The offscreen recorder task is gone or its queue is closed.
    #[error("Offscreen recorder unavailable: {reason}")]
    RecorderUnavailable {
        /// Why the recorder could not be reached.
        reason: String,
    },

    /// The recorder did not confirm a stop in time.
    #[error("Recorder did not confirm stop within {timeout_ms}ms")]
    StopTimedOut {
        /// Configured timeout.
        timeout_ms: u64,
    },
}

impl PipelineError {
    /// True for errors that come from the relay socket.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PipelineError::RelayConnect { .. }
                | PipelineError::RelayClosed
                | PipelineError::RelayTransport { .. }
        )
    }
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;
