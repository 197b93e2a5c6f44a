use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::CaptureHandle;

/// Execution context a runtime message is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTarget {
    Offscreen,
    Background,
}

/// Command types understood by the offscreen recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    StartRecording,
    StopRecording,
    /// Anything else; rejected by the recorder
    #[serde(other)]
    Unrecognized,
}

/// Command sent from the coordinator to the offscreen recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffscreenCommand {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub target: MessageTarget,
    /// Capture handle (start-recording only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CaptureHandle>,
    /// Session the command belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
}

impl OffscreenCommand {
    pub fn start(handle: CaptureHandle, session_id: Uuid) -> Self {
        Self {
            kind: CommandKind::StartRecording,
            target: MessageTarget::Offscreen,
            data: Some(handle),
            session_id: Some(session_id),
        }
    }

    pub fn stop(session_id: Option<Uuid>) -> Self {
        Self {
            kind: CommandKind::StopRecording,
            target: MessageTarget::Offscreen,
            data: None,
            session_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    #[serde(rename = "audio-chunk")]
    AudioChunk,
}

/// Encoded audio sent from the offscreen recorder to the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMessage {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub target: MessageTarget,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>, // Base64 in JSON form
    pub session_id: Uuid,
    pub sequence: u64,
    #[serde(rename = "final")]
    pub final_chunk: bool,
}

impl ChunkMessage {
    pub fn new(session_id: Uuid, sequence: u64, data: Vec<u8>, final_chunk: bool) -> Self {
        Self {
            kind: ChunkKind::AudioChunk,
            target: MessageTarget::Background,
            data,
            session_id,
            sequence,
            final_chunk,
        }
    }
}

/// Messages from the popup/action UI to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiMessage {
    ToggleEcho,
}

/// Messages delivered to a tab's overlay renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlayCommand {
    FromBackground { payload: String },
    ToggleOverlay,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
