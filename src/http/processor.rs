/// Payload of one inbound relay message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayPayload {
    Binary(Vec<u8>),
    Text(String),
}

impl RelayPayload {
    pub fn len(&self) -> usize {
        match self {
            RelayPayload::Binary(data) => data.len(),
            RelayPayload::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where an inbound message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkContext {
    /// Connection number, unique per server process
    pub connection_id: u64,
    /// Position of the message within its connection (0-indexed)
    pub sequence: u64,
}

/// Extension point for real audio processing
///
/// Called once per inbound message; the returned text is sent back as the
/// single reply to that message. Message boundaries are transport
/// boundaries, not audio segment boundaries.
#[async_trait::async_trait]
pub trait ChunkProcessor: Send + Sync {
    async fn process(&self, ctx: &ChunkContext, payload: RelayPayload) -> String;

    /// Get processor name for logging
    fn name(&self) -> &str;
}

/// Replies with a fixed status string regardless of content
#[derive(Debug, Clone)]
pub struct StatusReplyProcessor {
    reply: String,
}

impl StatusReplyProcessor {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait::async_trait]
impl ChunkProcessor for StatusReplyProcessor {
    async fn process(&self, _ctx: &ChunkContext, _payload: RelayPayload) -> String {
        self.reply.clone()
    }

    fn name(&self) -> &str {
        "status-reply"
    }
}
