// Tests for the overlay renderer

use echo_relay::messages::OverlayCommand;
use echo_relay::overlay::{Overlay, Tone, PLACEHOLDER_TEXT};

#[test]
fn test_sarcastic_payload_renders_purple_italic() {
    let mut overlay = Overlay::new();

    overlay.handle(OverlayCommand::FromBackground {
        payload: "That was SARCASTIC, clearly".to_string(),
    });

    assert!(overlay.is_visible(), "Overlay should be created on demand");
    assert_eq!(overlay.text(), Some("That was SARCASTIC, clearly"));
    assert_eq!(overlay.tone(), Some(Tone::Sarcastic));

    let style = overlay.style().unwrap();
    assert_eq!(style.color, "#A855F7");
    assert!(style.italic);
}

#[test]
fn test_overlay_created_on_first_reply() {
    let mut overlay = Overlay::default();

    overlay.handle(OverlayCommand::FromBackground {
        payload: "well, that's sarcastic".to_string(),
    });

    assert_eq!(overlay.text(), Some("well, that's sarcastic"));
    assert_eq!(overlay.tone(), Some(Tone::Sarcastic));
    assert_eq!(overlay.style().map(|s| s.color), Some("#A855F7"));
}

#[test]
fn test_neutral_payload_renders_white_normal() {
    let mut overlay = Overlay::mounted();

    overlay.handle(OverlayCommand::FromBackground {
        payload: "Processing audio...".to_string(),
    });

    let style = overlay.style().unwrap();
    assert_eq!(style.color, "white");
    assert!(!style.italic);
}

#[test]
fn test_each_message_replaces_the_last() {
    let mut overlay = Overlay::new();

    overlay.update("sarcastic remark");
    overlay.update("plain remark");

    assert_eq!(overlay.text(), Some("plain remark"));
    assert_eq!(overlay.tone(), Some(Tone::Neutral));
}

#[test]
fn test_toggle_mounts_placeholder_then_removes() {
    let mut overlay = Overlay::new();
    assert!(!overlay.is_visible());

    overlay.handle(OverlayCommand::ToggleOverlay);
    assert_eq!(overlay.text(), Some(PLACEHOLDER_TEXT));
    assert_eq!(overlay.tone(), Some(Tone::Neutral));

    overlay.handle(OverlayCommand::ToggleOverlay);
    assert!(!overlay.is_visible());
    assert_eq!(overlay.style(), None);
}

#[test]
fn test_tone_classification_is_case_insensitive() {
    assert_eq!(Tone::classify("Sarcastic"), Tone::Sarcastic);
    assert_eq!(Tone::classify("very sArCaStIc tone"), Tone::Sarcastic);
    assert_eq!(Tone::classify("sarcasm"), Tone::Neutral);
    assert_eq!(Tone::classify(""), Tone::Neutral);
}
