//! On-page overlay renderer
//!
//! Passive display surface: shows the latest text from the background
//! coordinator with a tone-dependent style. Nothing is retained between
//! messages.

use crate::messages::OverlayCommand;

/// Text shown when the overlay is first mounted
pub const PLACEHOLDER_TEXT: &str = "Echo is listening...";

const SARCASM_MARKER: &str = "sarcastic";

/// Coarse tone classification of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Sarcastic,
}

impl Tone {
    /// Case-insensitive keyword match
    pub fn classify(text: &str) -> Self {
        if text.to_lowercase().contains(SARCASM_MARKER) {
            Tone::Sarcastic
        } else {
            Tone::Neutral
        }
    }

    pub fn style(self) -> OverlayStyle {
        match self {
            Tone::Sarcastic => OverlayStyle {
                color: "#A855F7", // purple
                italic: true,
            },
            Tone::Neutral => OverlayStyle {
                color: "white",
                italic: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayStyle {
    pub color: &'static str,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Surface {
    text: String,
    tone: Tone,
}

impl Surface {
    fn placeholder() -> Self {
        Self {
            text: PLACEHOLDER_TEXT.to_string(),
            tone: Tone::Neutral,
        }
    }
}

/// Overlay state for one tab
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    surface: Option<Surface>,
}

impl Overlay {
    /// Overlay with no surface mounted
    pub fn new() -> Self {
        Self { surface: None }
    }

    /// Overlay mounted with the placeholder text
    pub fn mounted() -> Self {
        Self {
            surface: Some(Surface::placeholder()),
        }
    }

    pub fn handle(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::FromBackground { payload } => self.update(payload),
            OverlayCommand::ToggleOverlay => self.toggle(),
        }
    }

    /// Replace the displayed text, mounting the surface if needed
    pub fn update(&mut self, text: impl Into<String>) {
        let text = text.into();
        let tone = Tone::classify(&text);
        self.surface = Some(Surface { text, tone });
    }

    /// Show/hide independent of recording state
    pub fn toggle(&mut self) {
        self.surface = match self.surface.take() {
            Some(_) => None,
            None => Some(Surface::placeholder()),
        };
    }

    pub fn is_visible(&self) -> bool {
        self.surface.is_some()
    }

    pub fn text(&self) -> Option<&str> {
        self.surface.as_ref().map(|s| s.text.as_str())
    }

    pub fn tone(&self) -> Option<Tone> {
        self.surface.as_ref().map(|s| s.tone)
    }

    pub fn style(&self) -> Option<OverlayStyle> {
        self.tone().map(Tone::style)
    }
}
