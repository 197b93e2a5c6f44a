use tokio::sync::mpsc;
use tracing::info;

use super::offscreen::OffscreenRecorder;
use crate::error::{PipelineError, Result};
use crate::messages::OffscreenCommand;

/// Sending side of an offscreen document's command channel
#[derive(Debug, Clone)]
pub struct OffscreenHandle {
    id: String,
    commands: mpsc::Sender<OffscreenCommand>,
}

impl OffscreenHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a command for the recorder
    pub async fn dispatch(&self, command: OffscreenCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|e| PipelineError::RecorderUnavailable {
                reason: format!("{} is closed ({:?} dropped)", self.id, e.0.kind),
            })
    }

    /// False once the document task has exited
    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Isolated execution context that hosts the recorder
///
/// Commands are processed one at a time in arrival order.
pub struct OffscreenDocument;

impl OffscreenDocument {
    pub fn spawn(id: &str, mut recorder: OffscreenRecorder, queue_depth: usize) -> OffscreenHandle {
        let (tx, mut rx) = mpsc::channel(queue_depth.max(1));
        let doc_id = id.to_string();

        tokio::spawn(async move {
            info!("Offscreen document {} created", doc_id);

            while let Some(command) = rx.recv().await {
                recorder.apply(command).await;
            }

            // All handles dropped: release the device if still held
            if recorder.is_recording() {
                let _ = recorder.stop_recording().await;
            }

            info!("Offscreen document {} closed", doc_id);
        });

        OffscreenHandle {
            id: id.to_string(),
            commands: tx,
        }
    }
}
