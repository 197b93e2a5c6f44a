use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::{AudioFrame, FrameEncoder, MediaDevices, PlaybackSink};
use crate::error::{PipelineError, Result};
use crate::messages::{ChunkMessage, CommandKind, MessageTarget, OffscreenCommand};
use crate::platform::CaptureHandle;

/// Events reported by the offscreen recorder to the coordinator
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// Capture device opened and encoder running
    Started { session_id: Uuid },
    /// Encoded audio ready to forward
    Chunk(ChunkMessage),
    /// Recorder finalized; the final chunk has already been emitted
    Stopped(RecordingSummary),
    /// A command failed; `session_id` is the one the command carried
    Failed {
        command: CommandKind,
        session_id: Option<Uuid>,
        error: PipelineError,
    },
}

/// Totals for one finished recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSummary {
    pub session_id: Uuid,
    pub chunks: u64,
    pub bytes: u64,
}

/// The capture device and encoder of the offscreen context
///
/// Frames flow from the media stream into a pump task that plays them
/// locally, encodes them and emits fixed-size chunks. Stopping flushes the
/// remainder as the final chunk.
pub struct OffscreenRecorder {
    media: Arc<dyn MediaDevices>,
    playback: Arc<dyn PlaybackSink>,
    events: mpsc::Sender<RecorderEvent>,
    frame_bytes: usize,
    active: Option<ActiveRecording>,
    pending: Arc<AtomicUsize>,
}

struct ActiveRecording {
    session_id: Uuid,
    stop_tx: oneshot::Sender<()>,
    pump: JoinHandle<RecordingSummary>,
}

impl OffscreenRecorder {
    pub fn new(
        media: Arc<dyn MediaDevices>,
        playback: Arc<dyn PlaybackSink>,
        events: mpsc::Sender<RecorderEvent>,
        frame_bytes: usize,
    ) -> Self {
        Self {
            media,
            playback,
            events,
            frame_bytes,
            active: None,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open the capture stream and start encoding
    pub async fn start_recording(&mut self, handle: &CaptureHandle, session_id: Uuid) -> Result<()> {
        if self.active.is_some() {
            return Err(PipelineError::AlreadyRecording);
        }

        info!("Starting offscreen recording {} via {}", session_id, self.media.name());

        let frames = self.media.open(handle).await?;
        let (stop_tx, stop_rx) = oneshot::channel();

        let pump = tokio::spawn(pump_frames(
            frames,
            stop_rx,
            FrameEncoder::new(self.frame_bytes),
            session_id,
            self.events.clone(),
            Arc::clone(&self.playback),
            Arc::clone(&self.pending),
        ));

        self.active = Some(ActiveRecording {
            session_id,
            stop_tx,
            pump,
        });

        Ok(())
    }

    /// Finalize the encoder and release the capture device
    pub async fn stop_recording(&mut self) -> Result<RecordingSummary> {
        let active = self.active.take().ok_or(PipelineError::NotRecording)?;

        info!("Stopping offscreen recording {}", active.session_id);

        // The pump may already be gone if the stream ended on its own
        let _ = active.stop_tx.send(());

        let summary = active
            .pump
            .await
            .map_err(|e| PipelineError::RecorderUnavailable {
                reason: format!("encoder task failed: {}", e),
            })?;

        self.pending.store(0, Ordering::SeqCst);

        info!(
            "Offscreen recording {} finished: {} chunks, {} bytes",
            summary.session_id, summary.chunks, summary.bytes
        );

        Ok(summary)
    }

    /// Apply one command and report the outcome as an event
    pub async fn apply(&mut self, command: OffscreenCommand) {
        if command.target != MessageTarget::Offscreen {
            debug!("Ignoring message for {:?}", command.target);
            return;
        }

        let session_id = command.session_id;
        let failed = |error| RecorderEvent::Failed {
            command: command.kind,
            session_id,
            error,
        };

        let event = match command.kind {
            CommandKind::StartRecording => {
                let id = session_id.unwrap_or_else(Uuid::new_v4);
                let result = match &command.data {
                    Some(handle) => self.start_recording(handle, id).await,
                    None => Err(PipelineError::DeviceUnavailable {
                        reason: "start-recording without a capture handle".to_string(),
                    }),
                };
                match result {
                    Ok(()) => RecorderEvent::Started { session_id: id },
                    Err(error) => failed(error),
                }
            }
            CommandKind::StopRecording => {
                // A stop aimed at another session must not end this one
                let current = self.active.as_ref().map(|a| a.session_id);
                match (session_id, current) {
                    (Some(wanted), Some(running)) if wanted != running => {
                        debug!("Stop for {} while recording {}", wanted, running);
                        failed(PipelineError::NotRecording)
                    }
                    _ => match self.stop_recording().await {
                        Ok(summary) => RecorderEvent::Stopped(summary),
                        Err(error) => failed(error),
                    },
                }
            }
            CommandKind::Unrecognized => failed(PipelineError::UnknownCommand {
                command: format!("{:?}", command.kind),
            }),
        };

        if let RecorderEvent::Failed { error, .. } = &event {
            error!("Offscreen command {:?} failed: {}", command.kind, error);
        }

        if self.events.send(event).await.is_err() {
            warn!("Coordinator is gone, dropping recorder event");
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Encoded bytes held back waiting for a full frame
    pub fn buffered_bytes(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

async fn pump_frames(
    mut frames: mpsc::Receiver<AudioFrame>,
    mut stop_rx: oneshot::Receiver<()>,
    mut encoder: FrameEncoder,
    session_id: Uuid,
    events: mpsc::Sender<RecorderEvent>,
    playback: Arc<dyn PlaybackSink>,
    pending: Arc<AtomicUsize>,
) -> RecordingSummary {
    let mut summary = RecordingSummary {
        session_id,
        chunks: 0,
        bytes: 0,
    };
    let mut stream_open = true;

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            frame = frames.recv(), if stream_open => match frame {
                Some(frame) => {
                    playback.play(&frame);

                    for data in encoder.push(&frame) {
                        emit(&events, &mut summary, data, false).await;
                    }
                    pending.store(encoder.buffered_len(), Ordering::SeqCst);
                }
                None => {
                    info!("Capture stream for {} ended", session_id);
                    stream_open = false;
                }
            },
        }
    }

    // Release the device before flushing
    drop(frames);

    let tail = encoder.finish();
    pending.store(0, Ordering::SeqCst);
    emit(&events, &mut summary, tail, true).await;

    summary
}

async fn emit(
    events: &mpsc::Sender<RecorderEvent>,
    summary: &mut RecordingSummary,
    data: Vec<u8>,
    final_chunk: bool,
) {
    let len = data.len() as u64;
    let chunk = ChunkMessage::new(summary.session_id, summary.chunks, data, final_chunk);

    debug!(
        "Emitting chunk {} ({} bytes, final={})",
        summary.chunks, len, final_chunk
    );

    if events.send(RecorderEvent::Chunk(chunk)).await.is_err() {
        warn!("Coordinator is gone, dropping chunk {}", summary.chunks);
    }

    summary.chunks += 1;
    summary.bytes += len;
}
