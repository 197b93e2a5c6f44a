//! Relay endpoint and site server
//!
//! One listener serves:
//! - GET /api/ws - relay socket (binary chunks in, one text reply each)
//! - GET /api/relay/status - relay traffic counters
//! - GET /health - Health check
//! - everything else - static marketing site files

mod handlers;
mod processor;
mod routes;
mod state;

pub use processor::{ChunkContext, ChunkProcessor, RelayPayload, StatusReplyProcessor};
pub use routes::create_router;
pub use state::{AppState, RelayStats, RelayStatsSnapshot};
