pub mod backend;
pub mod encoder;
pub mod file;

pub use backend::{AudioFrame, MediaDevices, NullPlayback, PlaybackSink};
pub use encoder::{FrameEncoder, DEFAULT_FRAME_BYTES};
pub use file::{AudioFile, FileMediaDevices};
