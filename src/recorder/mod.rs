//! Offscreen recorder
//!
//! The capture device and encoder live in their own task (the offscreen
//! document) and are reached only through the command channel:
//! - `start-recording` opens the tab's audio stream and starts encoding
//! - `stop-recording` flushes the final chunk and releases the device
//!
//! The registry guarantees a single document per id.

mod document;
mod offscreen;
mod registry;

pub use document::{OffscreenDocument, OffscreenHandle};
pub use offscreen::{OffscreenRecorder, RecorderEvent, RecordingSummary};
pub use registry::{OffscreenRegistry, OFFSCREEN_DOCUMENT_ID};
