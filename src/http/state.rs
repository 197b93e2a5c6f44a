use super::processor::ChunkProcessor;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Produces the reply for every inbound relay message
    pub processor: Arc<dyn ChunkProcessor>,

    /// Relay traffic counters
    pub stats: Arc<RelayStats>,
}

impl AppState {
    pub fn new(processor: Arc<dyn ChunkProcessor>) -> Self {
        Self {
            processor,
            stats: Arc::new(RelayStats::default()),
        }
    }
}

/// Relay endpoint counters
#[derive(Debug, Default)]
pub struct RelayStats {
    connections_total: AtomicU64,
    connections_open: AtomicU64,
    messages_received: AtomicU64,
    bytes_received: AtomicU64,
    replies_sent: AtomicU64,
}

impl RelayStats {
    /// Register a new connection and return its id
    pub fn connection_opened(&self) -> u64 {
        self.connections_open.fetch_add(1, Ordering::SeqCst);
        self.connections_total.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn connection_closed(&self) {
        self.connections_open.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn message_received(&self, bytes: usize) {
        self.messages_received.fetch_add(1, Ordering::SeqCst);
        self.bytes_received.fetch_add(bytes as u64, Ordering::SeqCst);
    }

    pub fn reply_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            connections_total: self.connections_total.load(Ordering::SeqCst),
            connections_open: self.connections_open.load(Ordering::SeqCst),
            messages_received: self.messages_received.load(Ordering::SeqCst),
            bytes_received: self.bytes_received.load(Ordering::SeqCst),
            replies_sent: self.replies_sent.load(Ordering::SeqCst),
        }
    }
}

/// Serializable view of [`RelayStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct RelayStatsSnapshot {
    pub connections_total: u64,
    pub connections_open: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub replies_sent: u64,
}
