use tokio::sync::mpsc;

use crate::error::Result;
use crate::platform::CaptureHandle;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the capture stream opened
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration of this frame in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let per_channel = self.samples.len() as u64 / self.channels as u64;
        per_channel * 1000 / self.sample_rate as u64
    }
}

/// Media device access for the offscreen recorder
///
/// Implementations:
/// - `FileMediaDevices`: plays a WAV file as if it were tab audio
/// - test doubles that push synthetic frames
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    /// Open the audio stream bound to a capture handle
    ///
    /// Returns a channel receiver that yields frames until the stream ends.
    /// Dropping the receiver releases the device.
    async fn open(&self, handle: &CaptureHandle) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Local output sink that keeps captured tab audio audible
pub trait PlaybackSink: Send + Sync {
    /// Play one captured frame
    fn play(&self, frame: &AudioFrame);
}

/// Playback sink that discards audio (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPlayback;

impl PlaybackSink for NullPlayback {
    fn play(&self, _frame: &AudioFrame) {}
}
