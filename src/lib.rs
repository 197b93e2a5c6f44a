pub mod audio;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod messages;
pub mod overlay;
pub mod platform;
pub mod recorder;
pub mod relay;

pub use audio::{AudioFile, AudioFrame, FileMediaDevices, FrameEncoder, MediaDevices, PlaybackSink};
pub use config::Config;
pub use coordinator::{
    CoordinatorConfig, CoordinatorHandle, CoordinatorStatus, RecordingCoordinator, SessionPhase,
    ToggleOutcome,
};
pub use error::PipelineError;
pub use http::{create_router, AppState, StatusReplyProcessor};
pub use messages::{ChunkMessage, OffscreenCommand, OverlayCommand, UiMessage};
pub use overlay::{Overlay, Tone};
pub use platform::{CaptureHandle, Platform, TabId};
pub use recorder::{OffscreenRecorder, OffscreenRegistry, RecorderEvent};
pub use relay::{RelayConnection, RelayConnector, WsRelayConnector};
