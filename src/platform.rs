//! Host platform seams used by the extension side of the pipeline
//!
//! The coordinator never talks to a browser directly. Tab queries, capture
//! handle resolution and message delivery to a tab's content script go
//! through these traits so the same state machine runs against a real host,
//! a WAV file, or test doubles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::audio::{MediaDevices, PlaybackSink};
use crate::error::{PipelineError, Result};
use crate::messages::OverlayCommand;
use crate::overlay::Overlay;
use crate::relay::RelayConnector;

/// Browser tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Opaque token identifying one tab's audio stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureHandle(String);

impl CaptureHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tab query and tab-capture access
#[async_trait::async_trait]
pub trait TabCapture: Send + Sync {
    /// Resolve the active tab of the current window
    async fn active_tab(&self) -> Result<TabId>;

    /// Obtain a capture handle for a tab's audio
    async fn capture_handle(&self, tab: TabId) -> Result<CaptureHandle>;
}

/// Message delivery to a tab's content script
#[async_trait::async_trait]
pub trait TabMessenger: Send + Sync {
    async fn send_to_tab(&self, tab: TabId, message: OverlayCommand) -> Result<()>;
}

/// Host services the coordinator depends on
#[derive(Clone)]
pub struct Platform {
    pub tabs: Arc<dyn TabCapture>,
    pub messenger: Arc<dyn TabMessenger>,
    pub media: Arc<dyn MediaDevices>,
    pub playback: Arc<dyn PlaybackSink>,
    pub relay: Arc<dyn RelayConnector>,
}

/// A single always-active tab
///
/// Used by the CLI capture mode where a WAV file stands in for tab audio.
#[derive(Debug, Clone)]
pub struct StaticTab {
    tab: TabId,
}

impl StaticTab {
    pub fn new(tab: TabId) -> Self {
        Self { tab }
    }
}

#[async_trait::async_trait]
impl TabCapture for StaticTab {
    async fn active_tab(&self) -> Result<TabId> {
        Ok(self.tab)
    }

    async fn capture_handle(&self, tab: TabId) -> Result<CaptureHandle> {
        if tab != self.tab {
            return Err(PipelineError::CaptureDenied {
                tab_id: tab.0,
                reason: "tab is not capturable".to_string(),
            });
        }
        Ok(CaptureHandle::new(format!("{}-{}", tab, uuid::Uuid::new_v4())))
    }
}

/// Messenger that renders overlay commands into a local [`Overlay`]
#[derive(Clone, Default)]
pub struct OverlayMessenger {
    overlay: Arc<Mutex<Overlay>>,
}

impl OverlayMessenger {
    pub fn new(overlay: Overlay) -> Self {
        Self {
            overlay: Arc::new(Mutex::new(overlay)),
        }
    }

    /// Shared overlay, for inspection
    pub fn overlay(&self) -> Arc<Mutex<Overlay>> {
        Arc::clone(&self.overlay)
    }
}

#[async_trait::async_trait]
impl TabMessenger for OverlayMessenger {
    async fn send_to_tab(&self, tab: TabId, message: OverlayCommand) -> Result<()> {
        let mut overlay = self.overlay.lock().await;
        overlay.handle(message);

        match overlay.text() {
            Some(text) => info!("[{}] overlay ({:?}): {}", tab, overlay.tone(), text),
            None => info!("[{}] overlay hidden", tab),
        }

        Ok(())
    }
}
