use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::backend::{AudioFrame, MediaDevices};
use crate::error::PipelineError;
use crate::platform::CaptureHandle;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .context("Failed to open WAV file")?;

        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            anyhow::bail!(
                "Unsupported WAV format: {} bits {:?} (expected 16-bit PCM)",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 /
            (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split the file into frames of `frame_ms` milliseconds
    pub fn frames(&self, frame_ms: u64) -> Vec<AudioFrame> {
        let per_frame = (self.sample_rate as u64 * self.channels as u64 * frame_ms / 1000)
            .max(self.channels as u64) as usize;

        self.samples
            .chunks(per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * frame_ms,
            })
            .collect()
    }
}

/// Media devices backed by a WAV file
///
/// Every capture handle opens the same file, paced in real time so the
/// recorder sees audio arrive the way a live tab would deliver it.
pub struct FileMediaDevices {
    audio: Arc<AudioFile>,
    frame_ms: u64,
    looped: bool,
}

impl FileMediaDevices {
    pub fn new(audio: AudioFile, frame_ms: u64, looped: bool) -> Self {
        Self {
            audio: Arc::new(audio),
            frame_ms: frame_ms.max(1),
            looped,
        }
    }
}

#[async_trait::async_trait]
impl MediaDevices for FileMediaDevices {
    async fn open(
        &self,
        handle: &CaptureHandle,
    ) -> crate::error::Result<mpsc::Receiver<AudioFrame>> {
        let frames = self.audio.frames(self.frame_ms);
        if frames.is_empty() {
            return Err(PipelineError::DeviceUnavailable {
                reason: format!("{} contains no audio", self.audio.path),
            });
        }

        info!("Opening file capture stream for {} ({})", handle, self.audio.path);

        let (tx, rx) = mpsc::channel(32);
        let frame_ms = self.frame_ms;
        let looped = self.looped;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
            let mut offset_ms = 0;

            'outer: loop {
                for frame in &frames {
                    ticker.tick().await;

                    let mut frame = frame.clone();
                    frame.timestamp_ms += offset_ms;

                    if tx.send(frame).await.is_err() {
                        // Receiver dropped: the recorder released the device
                        break 'outer;
                    }
                }

                if !looped {
                    break;
                }
                offset_ms += frames.len() as u64 * frame_ms;
            }

            debug!("File capture stream finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}
