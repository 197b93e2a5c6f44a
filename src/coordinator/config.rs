use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::DEFAULT_FRAME_BYTES;

/// Configuration for the recording coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Relay endpoint URL (e.g., "ws://localhost:3000/api/ws")
    pub relay_url: String,

    /// Size of each encoded audio chunk streamed to the relay
    pub frame_bytes: usize,

    /// How long to wait for the recorder to confirm a stop
    pub stop_timeout: Duration,

    /// Capacity of the recorder/relay/control event queues
    pub event_queue_depth: usize,

    /// Capacity of the offscreen command queue
    pub command_queue_depth: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://localhost:3000/api/ws".to_string(),
            frame_bytes: DEFAULT_FRAME_BYTES,
            stop_timeout: Duration::from_secs(5),
            event_queue_depth: 64,
            command_queue_depth: 8,
        }
    }
}
