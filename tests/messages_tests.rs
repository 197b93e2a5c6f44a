// Tests for the JSON shapes exchanged between contexts

use anyhow::Result;
use echo_relay::messages::{
    ChunkMessage, CommandKind, MessageTarget, OffscreenCommand, OverlayCommand, UiMessage,
};
use echo_relay::platform::CaptureHandle;
use serde_json::json;
use uuid::Uuid;

#[test]
fn test_start_command_shape() -> Result<()> {
    let session_id = Uuid::nil();
    let command = OffscreenCommand::start(CaptureHandle::new("stream-42"), session_id);

    let value = serde_json::to_value(&command)?;
    assert_eq!(
        value,
        json!({
            "type": "start-recording",
            "target": "offscreen",
            "data": "stream-42",
            "session_id": "00000000-0000-0000-0000-000000000000",
        })
    );

    Ok(())
}

#[test]
fn test_stop_command_omits_data() -> Result<()> {
    let value = serde_json::to_value(OffscreenCommand::stop(None))?;
    assert_eq!(value, json!({ "type": "stop-recording", "target": "offscreen" }));

    Ok(())
}

#[test]
fn test_unknown_command_type_parses_as_unrecognized() -> Result<()> {
    let command: OffscreenCommand =
        serde_json::from_value(json!({ "type": "rewind", "target": "offscreen" }))?;

    assert_eq!(command.kind, CommandKind::Unrecognized);
    assert_eq!(command.target, MessageTarget::Offscreen);
    assert!(command.data.is_none());

    Ok(())
}

#[test]
fn test_chunk_message_encodes_data_as_base64() -> Result<()> {
    let chunk = ChunkMessage::new(Uuid::nil(), 3, vec![0xde, 0xad, 0xbe, 0xef], true);

    let value = serde_json::to_value(&chunk)?;
    assert_eq!(value["type"], "audio-chunk");
    assert_eq!(value["target"], "background");
    assert_eq!(value["data"], "3q2+7w==");
    assert_eq!(value["sequence"], 3);
    assert_eq!(value["final"], true);

    let parsed: ChunkMessage = serde_json::from_value(value)?;
    assert_eq!(parsed, chunk);

    Ok(())
}

#[test]
fn test_chunk_message_rejects_invalid_base64() {
    let result: Result<ChunkMessage, _> = serde_json::from_value(json!({
        "type": "audio-chunk",
        "target": "background",
        "data": "not base64!",
        "session_id": Uuid::nil(),
        "sequence": 0,
        "final": false,
    }));

    assert!(result.is_err());
}

#[test]
fn test_ui_and_overlay_message_tags() -> Result<()> {
    assert_eq!(serde_json::to_value(UiMessage::ToggleEcho)?, json!({ "type": "TOGGLE_ECHO" }));

    let toggle: OverlayCommand = serde_json::from_value(json!({ "type": "TOGGLE_OVERLAY" }))?;
    assert_eq!(toggle, OverlayCommand::ToggleOverlay);

    let reply: OverlayCommand = serde_json::from_value(json!({
        "type": "FROM_BACKGROUND",
        "payload": "Processing audio...",
    }))?;
    assert_eq!(
        reply,
        OverlayCommand::FromBackground {
            payload: "Processing audio...".to_string()
        }
    );

    Ok(())
}
